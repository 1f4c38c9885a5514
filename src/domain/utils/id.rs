use bimap::BiMap;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::error::{Error, Result};

/// Textual identifier as it appears in the input tables.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub struct Id<T> {
    pub id: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(id: impl Into<String>) -> Self {
        Id { id: id.into(), _marker: PhantomData }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", tag_name::<T>("Id"), self.id)
    }
}

/// Dense position of an interned identifier. All hot loops index vectors with
/// this instead of hashing strings.
pub struct Index<T> {
    pub index: usize,
    _marker: PhantomData<T>,
}

impl<T> Index<T> {
    pub fn new(index: usize) -> Self {
        Index { index, _marker: PhantomData }
    }
}

// Manual impls: the tag types carry no data and must not constrain the index.
impl<T> Clone for Index<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Index<T> {}

impl<T> PartialEq for Index<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Index<T> {}

impl<T> PartialOrd for Index<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Index<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> Hash for Index<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Index<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", tag_name::<T>("Index"), self.index)
    }
}

fn tag_name<T>(suffix: &str) -> String {
    let full_name = std::any::type_name::<T>();
    let clean_name = full_name.split("::").last().unwrap_or(full_name);
    clean_name.replace("Tag", suffix)
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct ClientTag;
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct ServerTag;

pub type ClientIndex = Index<ClientTag>;
pub type ServerIndex = Index<ServerTag>;

/// Bidirectional interner between textual ids and dense indices.
///
/// Indices are handed out in insertion order, starting at zero, so they can be
/// used directly as vector offsets.
pub struct IdIndex<T> {
    map: BiMap<Id<T>, usize>,
    /// Indices ordered by their textual id, used for diff-friendly output.
    sorted: Vec<Index<T>>,
}

impl<T> IdIndex<T>
where
    Id<T>: Eq + Hash,
{
    pub fn new() -> Self {
        IdIndex { map: BiMap::new(), sorted: Vec::new() }
    }

    /// Interns `id` and returns its fresh index. A repeated id is an input
    /// inconsistency.
    pub fn intern(&mut self, id: impl Into<String>) -> Result<Index<T>> {
        let id: Id<T> = Id::new(id);
        let index = self.map.len();

        if let Err((id, _)) = self.map.insert_no_overwrite(id, index) {
            return Err(Error::InconsistentInput(format!("Duplicate {} '{}'.", tag_name::<T>(" id"), id)));
        }

        let position = self.sorted.partition_point(|existing| self.id_of(*existing).as_str() < self.id_of(Index::new(index)).as_str());
        self.sorted.insert(position, Index::new(index));

        Ok(Index::new(index))
    }

    pub fn from_ids<I, S>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = IdIndex::new();
        for id in ids {
            index.intern(id)?;
        }
        Ok(index)
    }

    pub fn index_of(&self, id: &str) -> Option<Index<T>> {
        self.map.get_by_left(&Id::<T>::new(id)).map(|index| Index::new(*index))
    }

    /// Returns the textual id of an index handed out by this interner.
    ///
    /// # Panics
    /// If `index` was not produced by this interner.
    pub fn id_of(&self, index: Index<T>) -> &Id<T> {
        match self.map.get_by_right(&index.index) {
            Some(id) => id,
            None => panic!("{:?} is not part of this id index (len {}).", index, self.map.len()),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// All indices in insertion order.
    pub fn indices(&self) -> impl Iterator<Item = Index<T>> + '_ {
        (0..self.map.len()).map(Index::new)
    }

    /// All indices ordered by textual id.
    pub fn sorted_by_id(&self) -> &[Index<T>] {
        &self.sorted
    }
}

impl<T> Clone for IdIndex<T>
where
    Id<T>: Clone + Eq + Hash,
{
    fn clone(&self) -> Self {
        IdIndex { map: self.map.clone(), sorted: self.sorted.clone() }
    }
}

impl<T> Default for IdIndex<T>
where
    Id<T>: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for IdIndex<T>
where
    Id<T>: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(&tag_name::<T>("IdIndex")).field("len", &self.map.len()).finish()
    }
}
