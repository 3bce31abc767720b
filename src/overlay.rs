//! Position-indexed side data.
//!
//! A [`PositionMap`] stores the state that is in effect from each of a sorted list of positions on.
//! Each entry holds the full state at its position rather than a change relative to the previous
//! entry, so a lookup is a single binary search.
//!
//! [`WarningStateMap`] uses it to answer which warnings `#pragma warning` directives have disabled
//! or enabled at any position of a file.

use std::{slice, sync::Arc};

use text_size::TextSize;

use crate::{
    error::{Result, SyntaxError},
    Language, SyntaxNode,
};

/// The state in effect from `position` up to the position of the next entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionEntry<T> {
    pub position: TextSize,
    pub state:    T,
}

/// Immutable entries ordered by strictly increasing position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionMap<T> {
    entries: Arc<[PositionEntry<T>]>,
}

impl<T> PositionMap<T> {
    /// Creates a map from entries that are sorted by strictly increasing position.
    pub fn new(entries: Vec<PositionEntry<T>>) -> Result<Self> {
        if entries.windows(2).any(|pair| pair[0].position >= pair[1].position) {
            return Err(SyntaxError::InvalidArgument(
                "entries must be sorted by strictly increasing position",
            ));
        }
        Ok(Self { entries: entries.into() })
    }

    /// Creates a map by folding `changes` into cumulative states, starting from `initial` at
    /// position 0.
    ///
    /// Changes must be sorted by position. Several changes at the same position are folded into a
    /// single entry.
    pub fn from_changes<I, D, F>(initial: T, changes: I, mut apply: F) -> Result<Self>
    where
        I: IntoIterator<Item = (TextSize, D)>,
        F: FnMut(&T, D) -> T,
    {
        let mut entries = vec![PositionEntry {
            position: 0.into(),
            state:    initial,
        }];
        for (position, change) in changes {
            // `entries` is never empty
            let Some(last) = entries.last_mut() else { unreachable!() };
            if position < last.position {
                return Err(SyntaxError::InvalidArgument("changes must be sorted by position"));
            }
            let state = apply(&last.state, change);
            if position == last.position {
                last.state = state;
            } else {
                entries.push(PositionEntry { position, state });
            }
        }
        Ok(Self { entries: entries.into() })
    }

    /// The entry with the greatest position that is not after `position`.
    pub fn entry_at(&self, position: TextSize) -> Option<&PositionEntry<T>> {
        let index = self.entries.partition_point(|entry| entry.position <= position);
        index.checked_sub(1).map(|index| &self.entries[index])
    }

    /// The state in effect at `position`, `None` before the first entry.
    #[inline]
    pub fn state_at(&self, position: TextSize) -> Option<&T> {
        self.entry_at(position).map(|entry| &entry.state)
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, PositionEntry<T>> {
        self.entries.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a, T> IntoIterator for &'a PositionMap<T> {
    type IntoIter = slice::Iter<'a, PositionEntry<T>>;
    type Item = &'a PositionEntry<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// How a warning is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PragmaWarningState {
    /// As configured outside of the source file.
    #[default]
    Default,
    Disabled,
    Enabled,
}

/// What a `#pragma warning` directive does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PragmaAction {
    Disable,
    /// Back to [`PragmaWarningState::Default`].
    Restore,
    Enable,
}

impl PragmaAction {
    fn state(self) -> PragmaWarningState {
        match self {
            PragmaAction::Disable => PragmaWarningState::Disabled,
            PragmaAction::Restore => PragmaWarningState::Default,
            PragmaAction::Enable => PragmaWarningState::Enabled,
        }
    }
}

/// A `#pragma warning` directive. Without ids, it applies to all warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PragmaDirective {
    /// End of the directive. The directive is in effect from here on.
    pub position: TextSize,
    pub action:   PragmaAction,
    pub ids:      Vec<Arc<str>>,
}

/// The accumulated effect of all directives up to some position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarningState {
    general:  PragmaWarningState,
    specific: im::HashMap<Arc<str>, PragmaWarningState>,
}

impl WarningState {
    /// The state of warnings that no directive has named since the last general directive.
    #[inline]
    pub fn general(&self) -> PragmaWarningState {
        self.general
    }

    /// The state of the warning `id`.
    pub fn get(&self, id: &str) -> PragmaWarningState {
        self.specific.get(id).copied().unwrap_or(self.general)
    }

    fn apply(&self, action: PragmaAction, ids: &[Arc<str>]) -> WarningState {
        let state = action.state();
        if ids.is_empty() {
            return WarningState {
                general:  state,
                specific: im::HashMap::new(),
            };
        }
        let mut specific = self.specific.clone();
        for id in ids {
            specific.insert(Arc::clone(id), state);
        }
        WarningState {
            general: self.general,
            specific,
        }
    }
}

/// The warning state at every position of a file, as set by `#pragma warning` directives.
///
/// ```
/// # use greenwood::overlay::*;
/// # use std::sync::Arc;
/// let map = WarningStateMap::new([
///     PragmaDirective { position: 10.into(), action: PragmaAction::Disable, ids: vec![Arc::from("W1")] },
///     PragmaDirective { position: 20.into(), action: PragmaAction::Restore, ids: vec![] },
/// ]);
/// assert_eq!(map.state_at("W1", 5.into()), PragmaWarningState::Default);
/// assert_eq!(map.state_at("W1", 15.into()), PragmaWarningState::Disabled);
/// assert_eq!(map.state_at("W2", 15.into()), PragmaWarningState::Default);
/// assert_eq!(map.state_at("W1", 25.into()), PragmaWarningState::Default);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningStateMap {
    map: PositionMap<WarningState>,
}

impl WarningStateMap {
    /// Creates the map from directives in any order. Directives at the same position apply in the
    /// order they are given.
    pub fn new<I>(directives: I) -> Self
    where
        I: IntoIterator<Item = PragmaDirective>,
    {
        let mut directives: Vec<PragmaDirective> = directives.into_iter().collect();
        directives.sort_by_key(|directive| directive.position);
        tracing::debug!(directives = directives.len(), "building warning state map");
        let changes = directives.into_iter().map(|directive| (directive.position, directive));
        let map = PositionMap::from_changes(WarningState::default(), changes, |state, directive| {
            state.apply(directive.action, &directive.ids)
        });
        match map {
            Ok(map) => Self { map },
            Err(err) => unreachable!("directives were sorted: {err}"),
        }
    }

    /// Creates the map from the directives in the tree of `root`.
    ///
    /// `recognize` is called with the structure of each directive trivia. It returns the action and
    /// ids of `#pragma warning` directives and `None` for all other directives.
    pub fn from_tree<L, F>(root: &SyntaxNode<L>, mut recognize: F) -> Self
    where
        L: Language,
        F: FnMut(&SyntaxNode<L>) -> Option<(PragmaAction, Vec<Arc<str>>)>,
    {
        let directives: Vec<PragmaDirective> = root
            .traverse()
            .descend_into(|node| node.contains_directives())
            .trivia()
            .filter(|trivia| trivia.is_directive())
            .filter_map(|trivia| {
                let structure = trivia.structure()?;
                let (action, ids) = recognize(&structure)?;
                Some(PragmaDirective {
                    position: structure.full_span().end(),
                    action,
                    ids,
                })
            })
            .collect();
        Self::new(directives)
    }

    /// The state of warning `id` at `position`.
    pub fn state_at(&self, id: &str, position: TextSize) -> PragmaWarningState {
        self.map
            .state_at(position)
            .map_or(PragmaWarningState::Default, |state| state.get(id))
    }

    /// The accumulated state at `position`.
    pub fn warning_state_at(&self, position: TextSize) -> Option<&WarningState> {
        self.map.state_at(position)
    }

    /// All entries, starting with the default state at position 0.
    #[inline]
    pub fn entries(&self) -> &PositionMap<WarningState> {
        &self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directive(position: u32, action: PragmaAction, ids: &[&str]) -> PragmaDirective {
        PragmaDirective {
            position: position.into(),
            action,
            ids: ids.iter().map(|&id| Arc::from(id)).collect(),
        }
    }

    #[test]
    fn lookup_before_first_and_after_last_entry() {
        let map = PositionMap::new(vec![
            PositionEntry {
                position: 5.into(),
                state:    'a',
            },
            PositionEntry {
                position: 9.into(),
                state:    'b',
            },
        ])
        .unwrap();
        assert_eq!(map.state_at(0.into()), None);
        assert_eq!(map.state_at(5.into()), Some(&'a'));
        assert_eq!(map.state_at(8.into()), Some(&'a'));
        assert_eq!(map.state_at(9.into()), Some(&'b'));
        assert_eq!(map.state_at(1000.into()), Some(&'b'));
    }

    #[test]
    fn unsorted_entries_are_rejected() {
        let entries = vec![
            PositionEntry {
                position: 9.into(),
                state:    (),
            },
            PositionEntry {
                position: 5.into(),
                state:    (),
            },
        ];
        assert!(matches!(PositionMap::new(entries), Err(SyntaxError::InvalidArgument(_))));
    }

    #[test]
    fn changes_fold_into_cumulative_entries() {
        let changes = [(2.into(), 1), (2.into(), 10), (7.into(), 100)];
        let map = PositionMap::from_changes(0, changes, |total, delta| total + delta).unwrap();
        let states: Vec<_> = map.iter().map(|entry| (u32::from(entry.position), entry.state)).collect();
        assert_eq!(states, [(0, 0), (2, 11), (7, 111)]);
        assert!(PositionMap::from_changes(0, [(3.into(), 1), (1.into(), 1)], |a, b| a + b).is_err());
    }

    #[test]
    fn general_directive_clears_specific_states() {
        let map = WarningStateMap::new([
            directive(10, PragmaAction::Disable, &["W1", "W2"]),
            directive(20, PragmaAction::Enable, &[]),
            directive(30, PragmaAction::Restore, &["W2"]),
        ]);
        assert_eq!(map.entries().len(), 4);
        assert_eq!(map.state_at("W1", 0.into()), PragmaWarningState::Default);
        assert_eq!(map.state_at("W2", 15.into()), PragmaWarningState::Disabled);
        assert_eq!(map.state_at("W3", 15.into()), PragmaWarningState::Default);
        assert_eq!(map.state_at("W1", 25.into()), PragmaWarningState::Enabled);
        assert_eq!(map.state_at("W2", 25.into()), PragmaWarningState::Enabled);
        assert_eq!(map.state_at("W2", 35.into()), PragmaWarningState::Default);
        assert_eq!(map.state_at("W1", 35.into()), PragmaWarningState::Enabled);
    }
}
