//! Tier-list board state.
//!
//! A board is an ordered set of rows (tiers) plus a gallery of unplaced
//! items. Every mutation is a plain function on an owned `Board`; errors are
//! returned before anything is touched, so a failed move never leaves a
//! half-applied state behind.

pub mod persist;
pub mod token;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::{DEFAULT_TIERS, TIER_COLORS};

// ==================== ITEMS ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Game,
    Franchise,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Game => "game",
            ItemKind::Franchise => "franchise",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "game" | "games" => Some(ItemKind::Game),
            "franchise" | "franchises" => Some(ItemKind::Franchise),
            _ => None,
        }
    }
}

/// Identity of an item on the board. Text form is `kind:id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    pub kind: ItemKind,
    pub id: i64,
}

impl ItemKey {
    pub fn game(id: i64) -> Self {
        Self { kind: ItemKind::Game, id }
    }

    pub fn franchise(id: i64) -> Self {
        Self { kind: ItemKind::Franchise, id }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let (kind, id) = raw.trim().split_once(':')?;
        Some(Self {
            kind: ItemKind::parse(kind)?,
            id: id.trim().parse().ok()?,
        })
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ItemRef {
    Game(Summary),
    Franchise(Summary),
}

impl ItemRef {
    pub fn key(&self) -> ItemKey {
        match self {
            ItemRef::Game(s) => ItemKey::game(s.id),
            ItemRef::Franchise(s) => ItemKey::franchise(s.id),
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.key().kind
    }

    pub fn summary(&self) -> &Summary {
        match self {
            ItemRef::Game(s) | ItemRef::Franchise(s) => s,
        }
    }
}

// ==================== ROWS ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub label: String,
    pub color: String,
    #[serde(default)]
    pub items: Vec<ItemRef>,
}

impl Row {
    pub fn new(label: &str, color: &str) -> Result<Self, BoardError> {
        Ok(Self {
            label: normalize_label(label)?,
            color: normalize_color(color)?,
            items: Vec::new(),
        })
    }
}

pub fn normalize_label(raw: &str) -> Result<String, BoardError> {
    let label = raw.trim();
    if label.is_empty() || label.chars().count() > 32 {
        return Err(BoardError::InvalidRow(
            "row label must be 1-32 characters".to_string(),
        ));
    }
    Ok(label.to_string())
}

pub fn normalize_color(raw: &str) -> Result<String, BoardError> {
    let color = raw.trim().to_ascii_lowercase();
    if !TIER_COLORS.contains(&color.as_str()) {
        return Err(BoardError::InvalidRow(format!("unknown color token '{}'", raw)));
    }
    Ok(color)
}

// ==================== CONTAINERS ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Container {
    Row { index: usize },
    Gallery,
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::Row { index } => write!(f, "row:{}", index),
            Container::Gallery => write!(f, "gallery:0"),
        }
    }
}

/// What is being dragged: the item and the container it was picked up from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragSource {
    pub container: Container,
    pub item: ItemKey,
}

/// Where it was dropped. `over` is the item the pointer ended on, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropTarget {
    pub container: Container,
    #[serde(default)]
    pub over: Option<ItemKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MoveOutcome {
    Unchanged,
    Reordered { container: Container, from: usize, to: usize },
    Moved { from: Container, to: Container, index: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("row {0} does not exist")]
    UnknownRow(usize),

    #[error("item {item} is not in {container}")]
    ItemNotInContainer { item: ItemKey, container: Container },

    #[error("item {0} is not on the board")]
    UnknownItem(ItemKey),

    #[error("drop target could not be resolved: {0}")]
    UnresolvedTarget(String),

    #[error("invalid row: {0}")]
    InvalidRow(String),

    #[error("board already has the maximum number of rows")]
    TooManyRows,

    #[error("invalid tier list: {0}")]
    InvalidPlan(String),
}

// ==================== BOARD ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub rows: Vec<Row>,
    #[serde(default)]
    pub gallery: Vec<ItemRef>,
}

impl Board {
    /// Board with the default S-D tiers and an empty gallery.
    pub fn with_default_rows() -> Self {
        let rows = DEFAULT_TIERS
            .iter()
            .map(|(label, color)| Row {
                label: label.to_string(),
                color: color.to_string(),
                items: Vec::new(),
            })
            .collect();
        Self {
            rows,
            gallery: Vec::new(),
        }
    }

    fn items(&self, container: Container) -> Result<&Vec<ItemRef>, BoardError> {
        match container {
            Container::Row { index } => self
                .rows
                .get(index)
                .map(|row| &row.items)
                .ok_or(BoardError::UnknownRow(index)),
            Container::Gallery => Ok(&self.gallery),
        }
    }

    fn items_mut(&mut self, container: Container) -> Result<&mut Vec<ItemRef>, BoardError> {
        match container {
            Container::Row { index } => self
                .rows
                .get_mut(index)
                .map(|row| &mut row.items)
                .ok_or(BoardError::UnknownRow(index)),
            Container::Gallery => Ok(&mut self.gallery),
        }
    }

    /// Container currently holding `key`, if any.
    pub fn locate(&self, key: ItemKey) -> Option<(Container, usize)> {
        for (row_index, row) in self.rows.iter().enumerate() {
            if let Some(pos) = row.items.iter().position(|item| item.key() == key) {
                return Some((Container::Row { index: row_index }, pos));
            }
        }
        self.gallery
            .iter()
            .position(|item| item.key() == key)
            .map(|pos| (Container::Gallery, pos))
    }

    pub fn contains(&self, key: ItemKey) -> bool {
        self.locate(key).is_some()
    }

    pub fn item_count(&self) -> usize {
        self.gallery.len() + self.rows.iter().map(|row| row.items.len()).sum::<usize>()
    }

    /// Adds an item to the end of the gallery. Returns false if it already
    /// sits anywhere on the board.
    pub fn add_to_gallery(&mut self, item: ItemRef) -> bool {
        if self.contains(item.key()) {
            return false;
        }
        self.gallery.push(item);
        true
    }

    pub fn remove_item(&mut self, key: ItemKey) -> Result<ItemRef, BoardError> {
        let (container, pos) = self.locate(key).ok_or(BoardError::UnknownItem(key))?;
        Ok(self.items_mut(container)?.remove(pos))
    }

    /// Applies a drag-end event.
    pub fn apply_drag(
        &mut self,
        source: DragSource,
        target: DropTarget,
    ) -> Result<MoveOutcome, BoardError> {
        let from = self
            .items(source.container)?
            .iter()
            .position(|item| item.key() == source.item)
            .ok_or(BoardError::ItemNotInContainer {
                item: source.item,
                container: source.container,
            })?;
        let dest_len = self.items(target.container)?.len();

        if source.container == target.container {
            let to = match target.over {
                Some(over) if over == source.item => return Ok(MoveOutcome::Unchanged),
                Some(over) => self
                    .items(target.container)?
                    .iter()
                    .position(|item| item.key() == over)
                    .unwrap_or(dest_len - 1),
                None => dest_len - 1,
            };
            if to == from {
                return Ok(MoveOutcome::Unchanged);
            }
            let items = self.items_mut(source.container)?;
            let moved = items.remove(from);
            items.insert(to, moved);
            return Ok(MoveOutcome::Reordered {
                container: source.container,
                from,
                to,
            });
        }

        let index = target
            .over
            .and_then(|over| {
                self.items(target.container)
                    .ok()?
                    .iter()
                    .position(|item| item.key() == over)
            })
            .unwrap_or(dest_len);

        let moved = self.items_mut(source.container)?.remove(from);
        self.items_mut(target.container)?.insert(index, moved);

        Ok(MoveOutcome::Moved {
            from: source.container,
            to: target.container,
            index,
        })
    }

    pub fn add_row(&mut self, label: &str, color: &str, max_rows: usize) -> Result<usize, BoardError> {
        if self.rows.len() >= max_rows {
            return Err(BoardError::TooManyRows);
        }
        self.rows.push(Row::new(label, color)?);
        Ok(self.rows.len() - 1)
    }

    pub fn update_row(
        &mut self,
        index: usize,
        label: Option<&str>,
        color: Option<&str>,
    ) -> Result<(), BoardError> {
        let label = label.map(normalize_label).transpose()?;
        let color = color.map(normalize_color).transpose()?;
        let row = self.rows.get_mut(index).ok_or(BoardError::UnknownRow(index))?;
        if let Some(label) = label {
            row.label = label;
        }
        if let Some(color) = color {
            row.color = color;
        }
        Ok(())
    }

    /// Removes a row; its items go back to the end of the gallery in order.
    pub fn remove_row(&mut self, index: usize) -> Result<Row, BoardError> {
        if index >= self.rows.len() {
            return Err(BoardError::UnknownRow(index));
        }
        let mut row = self.rows.remove(index);
        self.gallery.append(&mut row.items);
        Ok(row)
    }

    pub fn move_row(&mut self, from: usize, to: usize) -> Result<(), BoardError> {
        if from >= self.rows.len() {
            return Err(BoardError::UnknownRow(from));
        }
        if to >= self.rows.len() {
            return Err(BoardError::UnknownRow(to));
        }
        let row = self.rows.remove(from);
        self.rows.insert(to, row);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn game(id: i64) -> ItemRef {
        ItemRef::Game(Summary {
            id,
            name: format!("Game {}", id),
            cover_url: None,
        })
    }

    fn keys(items: &[ItemRef]) -> Vec<i64> {
        items.iter().map(|item| item.key().id).collect()
    }

    fn sample_board() -> Board {
        let mut board = Board::with_default_rows();
        board.rows[0].items = vec![game(1), game(2), game(3)];
        board.rows[1].items = vec![game(4), game(5)];
        board.gallery = vec![game(6), game(7)];
        board
    }

    fn all_ids(board: &Board) -> Vec<i64> {
        let mut ids: Vec<i64> = board
            .rows
            .iter()
            .flat_map(|row| keys(&row.items))
            .chain(keys(&board.gallery))
            .collect();
        ids.sort();
        ids
    }

    #[test]
    fn default_board_has_five_tiers() {
        let board = Board::with_default_rows();
        let labels: Vec<&str> = board.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["S", "A", "B", "C", "D"]);
        assert!(board.gallery.is_empty());
    }

    #[test]
    fn reorder_within_row_moves_to_over_index() {
        let mut board = sample_board();
        let outcome = board
            .apply_drag(
                DragSource { container: Container::Row { index: 0 }, item: ItemKey::game(1) },
                DropTarget { container: Container::Row { index: 0 }, over: Some(ItemKey::game(3)) },
            )
            .unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Reordered { container: Container::Row { index: 0 }, from: 0, to: 2 }
        );
        assert_eq!(keys(&board.rows[0].items), vec![2, 3, 1]);
    }

    #[test]
    fn dropping_on_itself_is_a_noop() {
        let mut board = sample_board();
        let before = board.clone();
        let outcome = board
            .apply_drag(
                DragSource { container: Container::Row { index: 0 }, item: ItemKey::game(2) },
                DropTarget { container: Container::Row { index: 0 }, over: Some(ItemKey::game(2)) },
            )
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Unchanged);
        assert_eq!(board, before);
    }

    #[test]
    fn dropping_last_item_on_own_container_is_a_noop() {
        let mut board = sample_board();
        let before = board.clone();
        let outcome = board
            .apply_drag(
                DragSource { container: Container::Gallery, item: ItemKey::game(7) },
                DropTarget { container: Container::Gallery, over: None },
            )
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Unchanged);
        assert_eq!(board, before);
    }

    #[test]
    fn cross_row_move_keeps_relative_order() {
        let mut board = sample_board();
        board
            .apply_drag(
                DragSource { container: Container::Row { index: 0 }, item: ItemKey::game(2) },
                DropTarget { container: Container::Row { index: 1 }, over: Some(ItemKey::game(5)) },
            )
            .unwrap();
        assert_eq!(keys(&board.rows[0].items), vec![1, 3]);
        assert_eq!(keys(&board.rows[1].items), vec![4, 2, 5]);
    }

    #[test]
    fn cross_container_move_appends_without_over() {
        let mut board = sample_board();
        let outcome = board
            .apply_drag(
                DragSource { container: Container::Gallery, item: ItemKey::game(6) },
                DropTarget { container: Container::Row { index: 2 }, over: None },
            )
            .unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Moved { from: Container::Gallery, to: Container::Row { index: 2 }, index: 0 }
        );
        assert_eq!(keys(&board.rows[2].items), vec![6]);
        assert_eq!(keys(&board.gallery), vec![7]);
    }

    #[test]
    fn over_item_outside_destination_appends() {
        let mut board = sample_board();
        board
            .apply_drag(
                DragSource { container: Container::Gallery, item: ItemKey::game(6) },
                DropTarget { container: Container::Row { index: 1 }, over: Some(ItemKey::game(1)) },
            )
            .unwrap();
        assert_eq!(keys(&board.rows[1].items), vec![4, 5, 6]);
    }

    #[test]
    fn unresolvable_destination_leaves_board_unchanged() {
        let mut board = sample_board();
        let before = board.clone();
        let err = board
            .apply_drag(
                DragSource { container: Container::Row { index: 0 }, item: ItemKey::game(1) },
                DropTarget { container: Container::Row { index: 9 }, over: None },
            )
            .unwrap_err();
        assert_eq!(err, BoardError::UnknownRow(9));
        assert_eq!(board, before);
    }

    #[test]
    fn wrong_source_container_is_rejected() {
        let mut board = sample_board();
        let before = board.clone();
        let err = board
            .apply_drag(
                DragSource { container: Container::Gallery, item: ItemKey::game(1) },
                DropTarget { container: Container::Row { index: 1 }, over: None },
            )
            .unwrap_err();
        assert!(matches!(err, BoardError::ItemNotInContainer { .. }));
        assert_eq!(board, before);
    }

    #[test]
    fn drag_sequence_never_duplicates_items() {
        let mut board = sample_board();
        let expected = all_ids(&board);
        let moves = [
            (Container::Gallery, 6, Container::Row { index: 0 }, Some(1)),
            (Container::Row { index: 0 }, 6, Container::Row { index: 4 }, None),
            (Container::Row { index: 1 }, 4, Container::Gallery, Some(7)),
            (Container::Gallery, 4, Container::Gallery, Some(7)),
            (Container::Row { index: 0 }, 3, Container::Row { index: 0 }, Some(1)),
            (Container::Row { index: 4 }, 6, Container::Row { index: 1 }, Some(5)),
        ];
        for (from, id, to, over) in moves {
            board
                .apply_drag(
                    DragSource { container: from, item: ItemKey::game(id) },
                    DropTarget { container: to, over: over.map(ItemKey::game) },
                )
                .unwrap();
            assert_eq!(all_ids(&board), expected);
        }
        assert_eq!(keys(&board.rows[0].items), vec![3, 1, 2]);
        assert_eq!(keys(&board.rows[1].items), vec![6, 5]);
        assert_eq!(keys(&board.gallery), vec![7, 4]);
    }

    #[test]
    fn add_to_gallery_skips_items_already_on_board() {
        let mut board = sample_board();
        assert!(!board.add_to_gallery(game(1)));
        assert!(board.add_to_gallery(game(8)));
        assert_eq!(board.item_count(), 8);
    }

    #[test]
    fn games_and_franchises_with_same_id_are_distinct() {
        let mut board = Board::with_default_rows();
        assert!(board.add_to_gallery(game(1)));
        assert!(board.add_to_gallery(ItemRef::Franchise(Summary {
            id: 1,
            name: "Series".to_string(),
            cover_url: None,
        })));
        assert_eq!(board.gallery.len(), 2);
    }

    #[test]
    fn removing_row_returns_items_to_gallery() {
        let mut board = sample_board();
        let removed = board.remove_row(0).unwrap();
        assert_eq!(removed.label, "S");
        assert_eq!(keys(&board.gallery), vec![6, 7, 1, 2, 3]);
        assert_eq!(board.rows.len(), 4);
    }

    #[test]
    fn row_management_validates_input() {
        let mut board = Board::with_default_rows();
        assert!(matches!(board.add_row("F", "magenta", 10), Err(BoardError::InvalidRow(_))));
        assert_eq!(board.add_row(" F ", "Gray", 10).unwrap(), 5);
        assert_eq!(board.rows[5].label, "F");
        assert_eq!(board.rows[5].color, "gray");
        assert_eq!(board.add_row("G", "red", 6), Err(BoardError::TooManyRows));

        board.update_row(0, Some("God tier"), None).unwrap();
        assert_eq!(board.rows[0].label, "God tier");
        assert_eq!(board.update_row(42, None, Some("red")), Err(BoardError::UnknownRow(42)));

        board.move_row(5, 0).unwrap();
        assert_eq!(board.rows[0].label, "F");
        assert_eq!(board.move_row(0, 6), Err(BoardError::UnknownRow(6)));
    }

    #[test]
    fn item_key_text_form_round_trips() {
        let key = ItemKey::franchise(42);
        assert_eq!(key.to_string(), "franchise:42");
        assert_eq!(ItemKey::parse("franchise:42"), Some(key));
        assert_eq!(ItemKey::parse("games:7"), Some(ItemKey::game(7)));
        assert_eq!(ItemKey::parse("movie:7"), None);
    }
}
