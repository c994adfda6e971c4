//! # Tags
//!
//! Tree-position metadata maintained automatically as an entity attaches to
//! and detaches from containers: parent, depth, and the identity of the
//! tree's root container. None of it is user-settable directly.

use std::time::SystemTime;

use crate::Identifier;

#[derive(Clone, Debug)]
pub struct Tags {
    pub parent_id: Option<Identifier>,
    pub tree_depth: u32,
    pub root_container_id: Option<Identifier>,
    pub created_at: SystemTime,
}

impl Default for Tags {
    fn default() -> Self {
        Self {
            parent_id: None,
            tree_depth: 0,
            root_container_id: None,
            created_at: SystemTime::now(),
        }
    }
}
