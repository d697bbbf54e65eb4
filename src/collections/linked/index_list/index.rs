use std::fmt::{self, Debug, Formatter};

/// The raw value used by [`OptIndex::NULL`].
pub const NULL_INDEX: u32 = u32::MAX;

/// An optional index into a node array, packed into a `u32`. [`NULL_INDEX`] represents the lack of
/// an index, which limits usable indices to `0..NULL_INDEX`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OptIndex(u32);

impl OptIndex {
    /// No index.
    pub const NULL: OptIndex = OptIndex(NULL_INDEX);

    /// Creates an OptIndex referring to the provided index.
    ///
    /// # Panics
    /// Panics if `index` can't be represented, i.e. `index >= NULL_INDEX`.
    #[track_caller]
    pub const fn new(index: usize) -> OptIndex {
        assert!(index < NULL_INDEX as usize, "Index too large to be linked!");
        OptIndex(index as u32)
    }

    /// Creates an OptIndex from its raw representation, where [`NULL_INDEX`] is null.
    pub const fn from_raw(raw: u32) -> OptIndex {
        OptIndex(raw)
    }

    /// Returns the raw representation of this OptIndex.
    pub const fn to_raw(self) -> u32 {
        self.0
    }

    /// Returns the index, if there is one.
    pub const fn get(self) -> Option<usize> {
        match self.0 {
            NULL_INDEX => None,
            index => Some(index as usize),
        }
    }

    pub const fn is_null(self) -> bool {
        self.0 == NULL_INDEX
    }

    pub const fn is_some(self) -> bool {
        !self.is_null()
    }
}

impl Default for OptIndex {
    fn default() -> Self {
        OptIndex::NULL
    }
}

impl From<usize> for OptIndex {
    fn from(value: usize) -> Self {
        OptIndex::new(value)
    }
}

impl From<Option<usize>> for OptIndex {
    fn from(value: Option<usize>) -> Self {
        value.map_or(OptIndex::NULL, OptIndex::new)
    }
}

impl From<OptIndex> for Option<usize> {
    fn from(value: OptIndex) -> Self {
        value.get()
    }
}

impl Debug for OptIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(index) => write!(f, "OptIndex({index})"),
            None => write!(f, "OptIndex(NULL)"),
        }
    }
}

/// The links embedded in every node of an index chain. A node with both links null is isolated.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Links {
    pub next: OptIndex,
    pub prev: OptIndex,
}

impl Links {
    /// Links with no neighbours on either side.
    pub const ISOLATED: Links = Links {
        next: OptIndex::NULL,
        prev: OptIndex::NULL,
    };

    pub const fn is_isolated(&self) -> bool {
        self.next.is_null() && self.prev.is_null()
    }
}

/// A type which can be threaded into an index chain by embedding [`Links`].
pub trait IndexNode {
    fn links(&self) -> &Links;

    fn links_mut(&mut self) -> &mut Links;
}

impl IndexNode for Links {
    fn links(&self) -> &Links {
        self
    }

    fn links_mut(&mut self) -> &mut Links {
        self
    }
}
