use std::collections::{HashMap, HashSet, VecDeque};

use rolegate_core::RoleId;

use crate::Role;

/// An id-addressed arena over a set of role nodes, used for every hierarchy
/// walk. Traversal is iterative with an explicit visited set, so a parent
/// chain that is cyclic in stored data terminates instead of overflowing the
/// stack; the write path separately rejects such chains up front.
#[derive(Debug, Default)]
pub struct RoleForest {
    nodes: HashMap<RoleId, RoleNode>,
}

#[derive(Debug)]
struct RoleNode {
    parent: Option<RoleId>,
    children: Vec<RoleId>,
}

impl RoleForest {
    /// Builds a forest from a snapshot of live roles. A parent reference to
    /// a role outside the snapshot (e.g. soft-deleted) ends its chain.
    #[must_use]
    pub fn from_roles(roles: &[Role]) -> Self {
        let mut nodes: HashMap<RoleId, RoleNode> = roles
            .iter()
            .map(|role| {
                (
                    role.id,
                    RoleNode {
                        parent: role.parent_role_id,
                        children: Vec::new(),
                    },
                )
            })
            .collect();

        for role in roles {
            if let Some(parent_id) = role.parent_role_id {
                if let Some(parent) = nodes.get_mut(&parent_id) {
                    parent.children.push(role.id);
                }
            }
        }

        Self { nodes }
    }

    /// Returns whether the forest contains the role.
    #[must_use]
    pub fn contains(&self, role_id: RoleId) -> bool {
        self.nodes.contains_key(&role_id)
    }

    /// Returns the direct children of a role. Order is not significant.
    #[must_use]
    pub fn children(&self, role_id: RoleId) -> &[RoleId] {
        self.nodes
            .get(&role_id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the chain self, parent, grandparent, …, root. Unknown ids
    /// yield an empty chain; a cyclic chain is cut at the first revisit.
    #[must_use]
    pub fn ancestor_chain(&self, role_id: RoleId) -> Vec<RoleId> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut cursor = Some(role_id);

        while let Some(current) = cursor {
            let Some(node) = self.nodes.get(&current) else {
                break;
            };
            if !visited.insert(current) {
                break;
            }
            chain.push(current);
            cursor = node.parent;
        }

        chain
    }

    /// Returns the transitive closure of a role's children, including the
    /// role itself. Unknown ids yield an empty set.
    #[must_use]
    pub fn descendants(&self, role_id: RoleId) -> Vec<RoleId> {
        if !self.nodes.contains_key(&role_id) {
            return Vec::new();
        }

        let mut collected = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([role_id]);

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            collected.push(current);
            if let Some(node) = self.nodes.get(&current) {
                queue.extend(node.children.iter().copied());
            }
        }

        collected
    }

    /// Returns whether re-parenting `role_id` under `proposed_parent` would
    /// make the role its own ancestor. Walks the proposed parent's chain
    /// and reports a cycle if the role's own id appears.
    #[must_use]
    pub fn would_create_cycle(&self, role_id: RoleId, proposed_parent: RoleId) -> bool {
        if role_id == proposed_parent {
            return true;
        }

        self.ancestor_chain(proposed_parent)
            .into_iter()
            .any(|ancestor| ancestor == role_id)
    }
}
