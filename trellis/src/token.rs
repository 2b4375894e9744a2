use std::fmt;

const KIND_SHIFT: u32 = 28;
const INDEX_MASK: u32 = (1 << KIND_SHIFT) - 1;
const LIGHT_KIND_SHIFT: u32 = 22;
const LIGHT_KIND_MASK: u32 = (1 << (KIND_SHIFT - LIGHT_KIND_SHIFT)) - 1;
const LIGHT_INDEX_MASK: u32 = (1 << LIGHT_KIND_SHIFT) - 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Triangle = 0,
    Sphere = 1,
    Instance = 2,
    Light = 3,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Triangle => write!(f, "triangle"),
            EntityKind::Sphere => write!(f, "sphere"),
            EntityKind::Instance => write!(f, "instance"),
            EntityKind::Light => write!(f, "light"),
        }
    }
}

/// Identifies a single leaf within a pack.
///
/// The top four bits hold the [`EntityKind`], the remaining 28 bits hold an
/// index into that kind's leaf array. Light tokens split those 28 bits further
/// into a 6-bit light sub-kind and a 22-bit light index.
///
/// Tokens are meaningful only within the pack that produced them.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityToken(u32);

impl EntityToken {
    pub const EMPTY: Self = Self(u32::MAX);

    /// Number of leaves of a single kind addressable by a token.
    pub const CAPACITY: usize = 1 << KIND_SHIFT;

    /// Number of lights of a single light sub-kind addressable by a token.
    pub const LIGHT_CAPACITY: usize = 1 << LIGHT_KIND_SHIFT;

    /// Number of distinct light sub-kinds.
    pub const LIGHT_KINDS: usize = (LIGHT_KIND_MASK + 1) as usize;

    pub fn new(kind: EntityKind, index: usize) -> Self {
        debug_assert!(kind != EntityKind::Light, "use `EntityToken::light()`");
        debug_assert!(index < Self::CAPACITY, "index out of range: {index}");

        Self(((kind as u32) << KIND_SHIFT) | (index as u32))
    }

    pub fn triangle(index: usize) -> Self {
        Self::new(EntityKind::Triangle, index)
    }

    pub fn sphere(index: usize) -> Self {
        Self::new(EntityKind::Sphere, index)
    }

    pub fn instance(index: usize) -> Self {
        Self::new(EntityKind::Instance, index)
    }

    pub fn light(light_kind: u8, index: usize) -> Self {
        debug_assert!((light_kind as usize) < Self::LIGHT_KINDS);
        debug_assert!(index < Self::LIGHT_CAPACITY, "index out of range: {index}");

        Self(
            ((EntityKind::Light as u32) << KIND_SHIFT)
                | ((light_kind as u32) << LIGHT_KIND_SHIFT)
                | (index as u32),
        )
    }

    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }

    pub fn kind(self) -> EntityKind {
        debug_assert!(!self.is_empty(), "decoding an empty token");

        match self.0 >> KIND_SHIFT {
            0 => EntityKind::Triangle,
            1 => EntityKind::Sphere,
            2 => EntityKind::Instance,
            _ => EntityKind::Light,
        }
    }

    pub fn index(self) -> usize {
        debug_assert!(!self.is_empty(), "decoding an empty token");

        (self.0 & INDEX_MASK) as usize
    }

    pub fn light_kind(self) -> u8 {
        debug_assert!(self.is(EntityKind::Light), "not a light: {self:?}");

        ((self.0 >> LIGHT_KIND_SHIFT) & LIGHT_KIND_MASK) as u8
    }

    pub fn light_index(self) -> usize {
        debug_assert!(self.is(EntityKind::Light), "not a light: {self:?}");

        (self.0 & LIGHT_INDEX_MASK) as usize
    }

    fn is(self, kind: EntityKind) -> bool {
        !self.is_empty() && self.kind() == kind
    }
}

impl Default for EntityToken {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for EntityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Empty");
        }

        match self.kind() {
            EntityKind::Triangle => write!(f, "Triangle({})", self.index()),
            EntityKind::Sphere => write!(f, "Sphere({})", self.index()),
            EntityKind::Instance => write!(f, "Instance({})", self.index()),
            EntityKind::Light => {
                write!(f, "Light({}, {})", self.light_kind(), self.light_index())
            }
        }
    }
}
