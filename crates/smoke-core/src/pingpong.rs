/// Two same-shaped slots exposed as `read` (last completed pass) and `write`
/// (being rendered into).
///
/// `swap` flips an index; slot contents never move. Consumers must not read
/// `write` in the same pass that produces it.
#[derive(Clone, Debug)]
pub struct PingPong<T> {
    slots: [T; 2],
    read: usize,
}

impl<T> PingPong<T> {
    pub fn new(first: T, second: T) -> Self {
        Self {
            slots: [first, second],
            read: 0,
        }
    }

    pub fn from_fn(mut make: impl FnMut(usize) -> T) -> Self {
        Self::new(make(0), make(1))
    }

    #[inline]
    pub fn read(&self) -> &T {
        &self.slots[self.read]
    }

    #[inline]
    pub fn write(&self) -> &T {
        &self.slots[self.read ^ 1]
    }

    #[inline]
    pub fn write_mut(&mut self) -> &mut T {
        &mut self.slots[self.read ^ 1]
    }

    /// Borrow `read` immutably and `write` mutably at once.
    pub fn split_mut(&mut self) -> (&T, &mut T) {
        let (lo, hi) = self.slots.split_at_mut(1);
        if self.read == 0 {
            (&lo[0], &mut hi[0])
        } else {
            (&hi[0], &mut lo[0])
        }
    }

    #[inline]
    pub fn swap(&mut self) {
        self.read ^= 1;
    }

    /// Index of the slot currently in the `read` role.
    #[inline]
    pub fn read_index(&self) -> usize {
        self.read
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }

    pub fn into_slots(self) -> [T; 2] {
        self.slots
    }
}
