/// Move-To-Front table: a permutation of the values 0..=255.
#[derive(Debug, Clone)]
pub struct MoveToFront {
    index: [u8; 256],
}

impl Default for MoveToFront {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveToFront {
    /// Identity table: value n sits at rank n.
    pub fn new() -> Self {
        let mut index = [0_u8; 256];
        index.iter_mut().enumerate().for_each(|(i, v)| *v = i as u8);
        Self { index }
    }

    /// Move `value` to the front and return the rank it had.
    pub fn value_to_front(&mut self, value: u8) -> u8 {
        // Walk the table, pushing every entry down by one until we reach the value.
        let mut previous = self.index[0];
        if previous == value {
            return 0;
        }
        let mut rank = 0;
        while previous != value {
            rank += 1;
            let temp = self.index[rank];
            self.index[rank] = previous;
            previous = temp;
        }
        self.index[0] = value;
        rank as u8
    }

    /// Move the value at `rank` to the front and return it.
    pub fn index_to_front(&mut self, rank: usize) -> u8 {
        let value = self.index[rank];
        // Shift each index in front of the rank down one, then put the value at the front.
        self.index.copy_within(0..rank, 1);
        self.index[0] = value;
        value
    }

    /// Look at the value of the given rank without moving it.
    pub fn peek(&self, rank: usize) -> u8 {
        self.index[rank]
    }
}
