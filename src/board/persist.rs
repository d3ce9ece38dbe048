//! Board <-> persisted tier list.
//!
//! Saving flattens a board into the three record shapes the database takes
//! (list, columns, items) with explicit positions. Gallery items are not part
//! of a saved tier list.

use serde::{Deserialize, Serialize};

use super::{Board, BoardError, ItemKind, ItemRef, Row, Summary};
use crate::models::{TierListColumn, TierListItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierListKind {
    Games,
    Franchises,
}

impl TierListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierListKind::Games => "games",
            TierListKind::Franchises => "franchises",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "games" | "game" => Some(TierListKind::Games),
            "franchises" | "franchise" => Some(TierListKind::Franchises),
            _ => None,
        }
    }

    pub fn item_kind(&self) -> ItemKind {
        match self {
            TierListKind::Games => ItemKind::Game,
            TierListKind::Franchises => ItemKind::Franchise,
        }
    }
}

/// `{name, is_public, type}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTierList {
    pub name: String,
    pub is_public: bool,
    #[serde(rename = "type")]
    pub kind: TierListKind,
}

/// `{label, color, position}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewColumn {
    pub label: String,
    pub color: String,
    pub position: i32,
}

/// One item of a column. `column` is the column's position in the plan; the
/// database id is only known once the column row exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedItem {
    pub column: usize,
    pub item_id: i64,
    pub game_id: Option<i64>,
    pub franchise_id: Option<i64>,
    pub name: String,
    pub cover_url: Option<String>,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierListPlan {
    pub list: NewTierList,
    pub columns: Vec<NewColumn>,
    pub items: Vec<PlannedItem>,
}

impl TierListPlan {
    pub fn from_board(
        name: &str,
        is_public: bool,
        kind: TierListKind,
        board: &Board,
    ) -> Result<Self, BoardError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BoardError::InvalidPlan("tier list name is empty".to_string()));
        }
        if board.rows.is_empty() {
            return Err(BoardError::InvalidPlan("tier list has no rows".to_string()));
        }

        let mut columns = Vec::with_capacity(board.rows.len());
        let mut items = Vec::new();

        for (column, row) in board.rows.iter().enumerate() {
            columns.push(NewColumn {
                label: row.label.clone(),
                color: row.color.clone(),
                position: column as i32,
            });

            for (position, item) in row.items.iter().enumerate() {
                if item.kind() != kind.item_kind() {
                    return Err(BoardError::InvalidPlan(format!(
                        "{} cannot be placed in a {} tier list",
                        item.key(),
                        kind.as_str()
                    )));
                }
                let summary = item.summary();
                let (game_id, franchise_id) = match item {
                    ItemRef::Game(s) => (Some(s.id), None),
                    ItemRef::Franchise(s) => (None, Some(s.id)),
                };
                items.push(PlannedItem {
                    column,
                    item_id: summary.id,
                    game_id,
                    franchise_id,
                    name: summary.name.clone(),
                    cover_url: summary.cover_url.clone(),
                    position: position as i32,
                });
            }
        }

        Ok(Self {
            list: NewTierList {
                name: name.to_string(),
                is_public,
                kind,
            },
            columns,
            items,
        })
    }
}

/// Rebuilds a board from stored columns and items. Input order does not
/// matter; both are sorted by `position`.
pub fn board_from_rows(mut columns: Vec<TierListColumn>, mut items: Vec<TierListItem>) -> Board {
    columns.sort_by_key(|c| c.position);
    items.sort_by_key(|i| i.position);

    let rows = columns
        .into_iter()
        .map(|column| {
            let row_items = items
                .iter()
                .filter(|item| item.column_id == column.id)
                .filter_map(item_ref_from_row)
                .collect();
            Row {
                label: column.label,
                color: column.color,
                items: row_items,
            }
        })
        .collect();

    Board {
        rows,
        gallery: Vec::new(),
    }
}

fn item_ref_from_row(item: &TierListItem) -> Option<ItemRef> {
    let summary = |id: i64| Summary {
        id,
        name: item.name.clone(),
        cover_url: item.cover_url.clone(),
    };
    match (item.game_id, item.franchise_id) {
        (Some(id), None) => Some(ItemRef::Game(summary(id))),
        (None, Some(id)) => Some(ItemRef::Franchise(summary(id))),
        _ => {
            tracing::warn!("Skipping tier list item {} with ambiguous reference", item.id);
            None
        }
    }
}
