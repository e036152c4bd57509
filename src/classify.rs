//! Window classification
//!
//! Decides whether a freshly mapped window (or any of its descendants)
//! belongs to the target application by inspecting WM_CLASS hints.

use std::collections::HashSet;

use x11rb::protocol::xproto::Window;

/// A window's WM_CLASS pair: instance name and class name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHint {
    #[allow(dead_code)]
    pub instance: String,
    pub class: String,
}

impl ClassHint {
    /// Parse a raw WM_CLASS property value (`instance\0class\0`).
    pub fn parse(raw: &[u8]) -> Option<Self> {
        let mut parts = raw.split(|&b| b == 0);
        let instance = parts.next()?;
        let class = parts.next()?;
        Some(Self {
            instance: String::from_utf8_lossy(instance).into_owned(),
            class: String::from_utf8_lossy(class).into_owned(),
        })
    }
}

/// Read access to the window tree, narrow enough to fake in tests.
pub trait WindowTree {
    /// The window's WM_CLASS hint, if it has one.
    fn class_hint(&self, window: Window) -> Option<ClassHint>;

    /// Direct children of the window; empty if the query fails.
    fn children(&self, window: Window) -> Vec<Window>;
}

/// Find the first window in the subtree rooted at `start` whose class name
/// equals `class`, ignoring ASCII case.
///
/// Pre-order: a matching window wins before its descendants are consulted.
/// Windows without a class hint are skipped but still searched through.
pub fn find_target_window<T: WindowTree + ?Sized>(
    tree: &T,
    start: Window,
    class: &str,
) -> Option<Window> {
    let mut visited = HashSet::new();
    search(tree, start, class, &mut visited)
}

fn search<T: WindowTree + ?Sized>(
    tree: &T,
    window: Window,
    class: &str,
    visited: &mut HashSet<Window>,
) -> Option<Window> {
    // The server reports a tree, but guard against cycles anyway.
    if !visited.insert(window) {
        return None;
    }

    if let Some(hint) = tree.class_hint(window) {
        if hint.class.eq_ignore_ascii_case(class) {
            return Some(window);
        }
    }

    tree.children(window)
        .into_iter()
        .find_map(|child| search(tree, child, class, visited))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct FakeTree {
        hints: HashMap<Window, ClassHint>,
        kids: HashMap<Window, Vec<Window>>,
        child_queries: RefCell<Vec<Window>>,
    }

    impl FakeTree {
        fn new() -> Self {
            Self {
                hints: HashMap::new(),
                kids: HashMap::new(),
                child_queries: RefCell::new(Vec::new()),
            }
        }

        fn hint(&mut self, window: Window, instance: &str, class: &str) {
            self.hints.insert(
                window,
                ClassHint {
                    instance: instance.into(),
                    class: class.into(),
                },
            );
        }

        fn kids(&mut self, window: Window, children: &[Window]) {
            self.kids.insert(window, children.to_vec());
        }
    }

    impl WindowTree for FakeTree {
        fn class_hint(&self, window: Window) -> Option<ClassHint> {
            self.hints.get(&window).cloned()
        }

        fn children(&self, window: Window) -> Vec<Window> {
            self.child_queries.borrow_mut().push(window);
            self.kids.get(&window).cloned().unwrap_or_default()
        }
    }

    #[test]
    fn test_matching_root_wins_without_descending() {
        let mut tree = FakeTree::new();
        tree.hint(0x10, "roxterm", "Roxterm");
        tree.hint(0x11, "roxterm", "Roxterm");
        tree.kids(0x10, &[0x11]);

        assert_eq!(find_target_window(&tree, 0x10, "Roxterm"), Some(0x10));
        assert!(tree.child_queries.borrow().is_empty());
    }

    #[test]
    fn test_class_match_ignores_case() {
        let mut tree = FakeTree::new();
        tree.hint(0x10, "roxterm", "ROXTERM");

        assert_eq!(find_target_window(&tree, 0x10, "Roxterm"), Some(0x10));
    }

    #[test]
    fn test_descends_through_hintless_windows() {
        let mut tree = FakeTree::new();
        tree.kids(0x10, &[0x11, 0x12]);
        tree.hint(0x12, "roxterm", "Roxterm");

        assert_eq!(find_target_window(&tree, 0x10, "Roxterm"), Some(0x12));
    }

    #[test]
    fn test_no_match_returns_none() {
        let mut tree = FakeTree::new();
        tree.hint(0x10, "xterm", "XTerm");
        tree.kids(0x10, &[0x11]);
        tree.hint(0x11, "panel", "Panel");

        assert_eq!(find_target_window(&tree, 0x10, "Roxterm"), None);
    }

    #[test]
    fn test_cyclic_tree_terminates() {
        let mut tree = FakeTree::new();
        tree.kids(0x10, &[0x11]);
        tree.kids(0x11, &[0x10]);

        assert_eq!(find_target_window(&tree, 0x10, "Roxterm"), None);
    }

    #[test]
    fn test_parse_class_hint_pair() {
        let hint = ClassHint::parse(b"roxterm\0Roxterm\0").unwrap();
        assert_eq!(hint.instance, "roxterm");
        assert_eq!(hint.class, "Roxterm");
    }

    #[test]
    fn test_parse_rejects_missing_class() {
        assert_eq!(ClassHint::parse(b"roxterm"), None);
    }
}
