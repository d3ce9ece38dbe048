//! Legacy `type:index:id` drag tokens.
//!
//! Older clients address drop targets with strings such as `row:0:game:123`
//! or `gallery:0:franchise:9`. Item keys themselves contain a colon, so a
//! token is split at most twice and everything after the second colon is the
//! item key. A token that is only an item key resolves to whichever
//! container currently holds that item.

use super::{Board, BoardError, Container, DragSource, DropTarget, ItemKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ParsedToken {
    container: Option<Container>,
    item: Option<ItemKey>,
}

fn parse(raw: &str) -> Result<ParsedToken, BoardError> {
    let raw = raw.trim();
    let mut parts = raw.splitn(3, ':');
    let head = parts.next().unwrap_or_default();
    let index = parts.next();
    let rest = parts.next();

    let container = match (head, index.map(|i| i.trim().parse::<usize>())) {
        ("row", Some(Ok(index))) => Some(Container::Row { index }),
        ("gallery", Some(Ok(_))) => Some(Container::Gallery),
        ("row", _) | ("gallery", _) => {
            return Err(BoardError::UnresolvedTarget(format!(
                "malformed container token '{}'",
                raw
            )))
        }
        _ => None,
    };

    match container {
        Some(container) => {
            let item = match rest.map(str::trim).filter(|s| !s.is_empty()) {
                Some(key) => Some(ItemKey::parse(key).ok_or_else(|| {
                    BoardError::UnresolvedTarget(format!("malformed item key '{}'", key))
                })?),
                None => None,
            };
            Ok(ParsedToken {
                container: Some(container),
                item,
            })
        }
        None => {
            let item = ItemKey::parse(raw).ok_or_else(|| {
                BoardError::UnresolvedTarget(format!("unrecognised token '{}'", raw))
            })?;
            Ok(ParsedToken {
                container: None,
                item: Some(item),
            })
        }
    }
}

pub fn resolve_source(board: &Board, raw: &str) -> Result<DragSource, BoardError> {
    let token = parse(raw)?;
    let item = token.item.ok_or_else(|| {
        BoardError::UnresolvedTarget(format!("source token '{}' names no item", raw.trim()))
    })?;
    let container = match token.container {
        Some(container) => container,
        None => board.locate(item).ok_or(BoardError::UnknownItem(item))?.0,
    };
    Ok(DragSource { container, item })
}

pub fn resolve_target(board: &Board, raw: &str) -> Result<DropTarget, BoardError> {
    let token = parse(raw)?;
    match (token.container, token.item) {
        (Some(container), over) => Ok(DropTarget { container, over }),
        (None, Some(item)) => {
            let (container, _) = board.locate(item).ok_or_else(|| {
                BoardError::UnresolvedTarget(format!("item {} is not on the board", item))
            })?;
            Ok(DropTarget {
                container,
                over: Some(item),
            })
        }
        (None, None) => Err(BoardError::UnresolvedTarget(raw.trim().to_string())),
    }
}

/// Text token for a container/item pair, as older clients produce them.
pub fn encode(container: Container, item: Option<ItemKey>) -> String {
    match item {
        Some(item) => format!("{}:{}", container, item),
        None => container.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::game;

    fn board() -> Board {
        let mut board = Board::with_default_rows();
        board.rows[1].items = vec![game(10), game(11)];
        board.gallery = vec![game(12)];
        board
    }

    #[test]
    fn item_key_with_colon_survives_split() {
        let source = resolve_source(&board(), "row:1:game:11").unwrap();
        assert_eq!(source.container, Container::Row { index: 1 });
        assert_eq!(source.item, ItemKey::game(11));
    }

    #[test]
    fn container_only_target_has_no_over() {
        let target = resolve_target(&board(), "row:3").unwrap();
        assert_eq!(target, DropTarget { container: Container::Row { index: 3 }, over: None });

        let target = resolve_target(&board(), "gallery:0").unwrap();
        assert_eq!(target.container, Container::Gallery);
    }

    #[test]
    fn bare_item_target_resolves_to_owning_container() {
        let target = resolve_target(&board(), "game:10").unwrap();
        assert_eq!(
            target,
            DropTarget { container: Container::Row { index: 1 }, over: Some(ItemKey::game(10)) }
        );
    }

    #[test]
    fn unknown_tokens_are_unresolved() {
        assert!(matches!(
            resolve_target(&board(), "game:999"),
            Err(BoardError::UnresolvedTarget(_))
        ));
        assert!(matches!(
            resolve_target(&board(), "row:x:game:1"),
            Err(BoardError::UnresolvedTarget(_))
        ));
        assert!(matches!(
            resolve_target(&board(), "shelf:0"),
            Err(BoardError::UnresolvedTarget(_))
        ));
        assert!(matches!(
            resolve_source(&board(), "row:1"),
            Err(BoardError::UnresolvedTarget(_))
        ));
    }

    #[test]
    fn encoded_tokens_resolve_back() {
        let token = encode(Container::Gallery, Some(ItemKey::game(12)));
        assert_eq!(token, "gallery:0:game:12");
        let source = resolve_source(&board(), &token).unwrap();
        assert_eq!(source.container, Container::Gallery);
    }

    #[test]
    fn resolved_tokens_drive_a_move() {
        let mut board = board();
        let source = resolve_source(&board, "gallery:0:game:12").unwrap();
        let target = resolve_target(&board, "game:11").unwrap();
        board.apply_drag(source, target).unwrap();
        let ids: Vec<i64> = board.rows[1].items.iter().map(|i| i.key().id).collect();
        assert_eq!(ids, vec![10, 12, 11]);
        assert!(board.gallery.is_empty());
    }
}
