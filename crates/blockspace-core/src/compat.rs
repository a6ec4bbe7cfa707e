//! Block type compatibility table
//!
//! A static policy: for every block type, whether it needs a parent, which
//! placements it accepts, and whether it can host children of its own.
//!
//! | Type   | Requires parent | Allowed placements | Hosts children |
//! |--------|-----------------|--------------------|----------------|
//! | folder | no              | root, folder       | yes            |
//! | page   | no              | root, folder       | yes            |
//! | text   | yes             | page, text         | yes            |
//! | sop    | yes             | text               | no             |
//! | image  | no              | root, folder       | no             |
//!
//! What a container actually accepts follows from the child side: pages end
//! up hosting only text, text hosts text and SOPs.

use std::fmt;

use crate::error::BlockError;
use crate::models::BlockType;

/// Where a block may be placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    /// Root of the space (no parent)
    Root,
    /// Under a parent of the given type
    Under(BlockType),
}

impl Placement {
    /// Placement for an optional parent type
    pub fn of(parent: Option<BlockType>) -> Self {
        parent.map_or(Placement::Root, Placement::Under)
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Root => f.write_str("root"),
            Placement::Under(t) => write!(f, "{}", t),
        }
    }
}

/// Placement rules for one block type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compatibility {
    /// The type cannot exist at the root of a space
    pub requires_parent: bool,
    /// Every placement the type may be created or moved into
    pub allowed_parents: &'static [Placement],
    /// Blocks of this type may have children
    pub hosts_children: bool,
}

impl Compatibility {
    /// Check whether `placement` is in the allowed set
    pub fn allows(&self, placement: Placement) -> bool {
        self.allowed_parents.contains(&placement)
    }
}

const FOLDER: Compatibility = Compatibility {
    requires_parent: false,
    allowed_parents: &[Placement::Root, Placement::Under(BlockType::Folder)],
    hosts_children: true,
};

const PAGE: Compatibility = Compatibility {
    requires_parent: false,
    allowed_parents: &[Placement::Root, Placement::Under(BlockType::Folder)],
    hosts_children: true,
};

const TEXT: Compatibility = Compatibility {
    requires_parent: true,
    allowed_parents: &[
        Placement::Under(BlockType::Page),
        Placement::Under(BlockType::Text),
    ],
    hosts_children: true,
};

// Not accepted under a page
const SOP: Compatibility = Compatibility {
    requires_parent: true,
    allowed_parents: &[Placement::Under(BlockType::Text)],
    hosts_children: false,
};

const IMAGE: Compatibility = Compatibility {
    requires_parent: false,
    allowed_parents: &[Placement::Root, Placement::Under(BlockType::Folder)],
    hosts_children: false,
};

impl BlockType {
    /// Compatibility record for this type
    pub fn rules(self) -> Compatibility {
        match self {
            BlockType::Folder => FOLDER,
            BlockType::Page => PAGE,
            BlockType::Text => TEXT,
            BlockType::Sop => SOP,
            BlockType::Image => IMAGE,
        }
    }
}

/// Check whether a `child` may be placed under `parent` (`None` = root)
pub fn is_valid_child(parent: Option<BlockType>, child: BlockType) -> bool {
    match parent {
        None => child.rules().allows(Placement::Root),
        Some(p) => p.rules().hosts_children && child.rules().allows(Placement::Under(p)),
    }
}

/// Validate a placement, reporting which rule failed
///
/// Rules are checked in order: a parent-requiring type at root, a leaf
/// parent, then the child's allowed set.
pub fn check_placement(child: BlockType, parent: Option<BlockType>) -> Result<(), BlockError> {
    let rules = child.rules();

    match parent {
        None if rules.requires_parent => Err(BlockError::MissingParent { block_type: child }),
        Some(p) if !p.rules().hosts_children => {
            Err(BlockError::ParentCannotHaveChildren { parent_type: p })
        }
        _ => {
            let placement = Placement::of(parent);
            if rules.allows(placement) {
                Ok(())
            } else {
                Err(BlockError::InvalidChildForParent {
                    child,
                    parent: placement.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::BlockType::*;

    #[test]
    fn test_requires_parent() {
        assert!(!Folder.rules().requires_parent);
        assert!(!Page.rules().requires_parent);
        assert!(Text.rules().requires_parent);
        assert!(Sop.rules().requires_parent);
        assert!(!Image.rules().requires_parent);
    }

    #[test]
    fn test_hosts_children() {
        assert!(Folder.rules().hosts_children);
        assert!(Page.rules().hosts_children);
        assert!(Text.rules().hosts_children);
        assert!(!Sop.rules().hosts_children);
        assert!(!Image.rules().hosts_children);
    }

    #[test]
    fn test_root_placement() {
        assert!(is_valid_child(None, Folder));
        assert!(is_valid_child(None, Page));
        assert!(is_valid_child(None, Image));
        assert!(!is_valid_child(None, Text));
        assert!(!is_valid_child(None, Sop));
    }

    #[test]
    fn test_valid_pairs() {
        let valid = [
            (Folder, Folder),
            (Folder, Page),
            (Folder, Image),
            (Page, Text),
            (Text, Text),
            (Text, Sop),
        ];

        for parent in BlockType::ALL {
            for child in BlockType::ALL {
                let expected = valid.contains(&(parent, child));
                assert_eq!(
                    is_valid_child(Some(parent), child),
                    expected,
                    "{} under {}",
                    child,
                    parent
                );
                assert_eq!(check_placement(child, Some(parent)).is_ok(), expected);
            }
        }
    }

    #[test]
    fn test_page_hosts_only_text() {
        let hosted: Vec<_> = BlockType::ALL
            .into_iter()
            .filter(|c| is_valid_child(Some(Page), *c))
            .collect();
        assert_eq!(hosted, vec![Text]);
    }

    #[test]
    fn test_sop_not_under_page() {
        let err = check_placement(Sop, Some(Page)).unwrap_err();
        assert!(matches!(err, BlockError::InvalidChildForParent { .. }));
    }

    #[test]
    fn test_check_placement_missing_parent() {
        for child in [Text, Sop] {
            let err = check_placement(child, None).unwrap_err();
            assert!(matches!(err, BlockError::MissingParent { block_type } if block_type == child));
        }
    }

    #[test]
    fn test_check_placement_leaf_parent() {
        // Leaf check wins over the child's allowed set
        for parent in [Sop, Image] {
            for child in BlockType::ALL {
                let err = check_placement(child, Some(parent)).unwrap_err();
                assert!(
                    matches!(err, BlockError::ParentCannotHaveChildren { parent_type } if parent_type == parent)
                );
            }
        }
    }

    #[test]
    fn test_check_placement_invalid_pair_message() {
        let err = check_placement(Folder, Some(Page)).unwrap_err();
        assert_eq!(err.to_string(), "folder cannot be a child of page");

        let err = check_placement(Text, Some(Folder)).unwrap_err();
        assert!(err.to_string().contains("cannot be a child of"));
    }

    #[test]
    fn test_placement_display() {
        assert_eq!(Placement::Root.to_string(), "root");
        assert_eq!(Placement::Under(Text).to_string(), "text");
        assert_eq!(Placement::of(None), Placement::Root);
    }
}
