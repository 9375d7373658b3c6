// Copyright (c) 2025 xmpp-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Nested roster groups, XEP-0083.
//!
//! Groups live in an arena indexed by their full name. A node owns the names
//! of its children, and only refers to its parent by name.

use std::collections::{BTreeSet, HashMap, HashSet};

use tokio_xmpp::jid::BareJid;

use super::Contact;

/// A point-in-time copy of a group, its subgroups and its contacts.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactGroup {
    /// Last segment of the full name.
    pub name: String,
    /// Delimiter-joined path from the top-level group.
    pub full_name: String,
    /// Full name of the enclosing group.
    pub parent: Option<String>,
    /// Subgroups, sorted by name.
    pub groups: Vec<ContactGroup>,
    /// Contacts directly in this group, sorted.
    pub contacts: Vec<Contact>,
}

impl ContactGroup {
    /// Find a group by full name in this group or below.
    pub fn find(&self, full_name: &str) -> Option<&ContactGroup> {
        if self.full_name == full_name {
            return Some(self);
        }
        self.groups.iter().find_map(|group| group.find(full_name))
    }
}

/// Split a group name into its path segments. Empty segments are dropped.
pub(crate) fn split_path(name: &str, delimiter: Option<&str>) -> Vec<String> {
    match delimiter {
        Some(delimiter) if !delimiter.is_empty() => name
            .split(delimiter)
            .filter(|segment| !segment.is_empty())
            .map(String::from)
            .collect(),
        _ if name.is_empty() => Vec::new(),
        _ => vec![name.to_owned()],
    }
}

pub(crate) fn join_path(segments: &[String], delimiter: Option<&str>) -> String {
    segments.join(delimiter.unwrap_or(""))
}

struct GroupNode {
    name: String,
    parent: Option<String>,
    children: BTreeSet<String>,
    contacts: HashSet<BareJid>,
}

#[derive(Default)]
pub(crate) struct GroupTree {
    nodes: HashMap<String, GroupNode>,
    roots: BTreeSet<String>,
    memberships: HashMap<BareJid, HashSet<String>>,
}

impl GroupTree {
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.memberships.clear();
    }

    pub(crate) fn contains(&self, full_name: &str) -> bool {
        self.nodes.contains_key(full_name)
    }

    /// Number of ancestors of a group, zero for a top-level group.
    pub(crate) fn depth(&self, full_name: &str) -> Option<usize> {
        let mut node = self.nodes.get(full_name)?;
        let mut depth = 0;
        while let Some(parent) = &node.parent {
            node = self.nodes.get(parent)?;
            depth += 1;
        }
        Some(depth)
    }

    pub(crate) fn parent(&self, full_name: &str) -> Option<&str> {
        self.nodes.get(full_name)?.parent.as_deref()
    }

    /// Place a contact in exactly the groups named, creating missing groups
    /// and pruning the ones it leaves when they end up empty.
    pub(crate) fn set_groups(&mut self, jid: &BareJid, groups: &[String], delimiter: Option<&str>) {
        let mut leaves = HashSet::new();
        for group in groups {
            let segments = split_path(group, delimiter);
            if segments.is_empty() {
                continue;
            }
            leaves.insert(self.ensure_path(&segments, delimiter));
        }

        // Join first, so that leaving a subgroup can't prune a new parent.
        for leaf in &leaves {
            if let Some(node) = self.nodes.get_mut(leaf) {
                node.contacts.insert(jid.clone());
            }
        }
        let previous = self.memberships.remove(jid).unwrap_or_default();
        for stale in previous.difference(&leaves) {
            self.leave(jid, stale);
        }
        if !leaves.is_empty() {
            self.memberships.insert(jid.clone(), leaves);
        }
    }

    pub(crate) fn remove_contact(&mut self, jid: &BareJid) {
        if let Some(previous) = self.memberships.remove(jid) {
            for leaf in previous {
                self.leave(jid, &leaf);
            }
        }
    }

    fn ensure_path(&mut self, segments: &[String], delimiter: Option<&str>) -> String {
        let mut parent: Option<String> = None;
        for depth in 0..segments.len() {
            let full_name = join_path(&segments[..=depth], delimiter);
            if !self.nodes.contains_key(&full_name) {
                self.nodes.insert(
                    full_name.clone(),
                    GroupNode {
                        name: segments[depth].clone(),
                        parent: parent.clone(),
                        children: BTreeSet::new(),
                        contacts: HashSet::new(),
                    },
                );
                match &parent {
                    Some(parent) => {
                        if let Some(node) = self.nodes.get_mut(parent) {
                            node.children.insert(full_name.clone());
                        }
                    }
                    None => {
                        self.roots.insert(full_name.clone());
                    }
                }
            }
            parent = Some(full_name);
        }
        // segments is never empty here.
        parent.unwrap_or_default()
    }

    fn leave(&mut self, jid: &BareJid, full_name: &str) {
        if let Some(node) = self.nodes.get_mut(full_name) {
            node.contacts.remove(jid);
        }
        self.prune(full_name);
    }

    /// Remove this group if empty, then its ancestors as they empty out.
    fn prune(&mut self, full_name: &str) {
        let mut current = Some(full_name.to_owned());
        while let Some(name) = current.take() {
            let Some(node) = self.nodes.get(&name) else {
                return;
            };
            if !node.contacts.is_empty() || !node.children.is_empty() {
                return;
            }
            let parent = node.parent.clone();
            self.nodes.remove(&name);
            match &parent {
                Some(parent) => {
                    if let Some(node) = self.nodes.get_mut(parent) {
                        node.children.remove(&name);
                    }
                }
                None => {
                    self.roots.remove(&name);
                }
            }
            current = parent;
        }
    }

    /// Every contact in this group or one of its subgroups.
    pub(crate) fn contacts_below(&self, full_name: &str) -> HashSet<BareJid> {
        let mut contacts = HashSet::new();
        let mut pending = vec![full_name.to_owned()];
        while let Some(name) = pending.pop() {
            if let Some(node) = self.nodes.get(&name) {
                contacts.extend(node.contacts.iter().cloned());
                pending.extend(node.children.iter().cloned());
            }
        }
        contacts
    }

    pub(crate) fn snapshot(&self, contacts: &HashMap<BareJid, Contact>) -> Vec<ContactGroup> {
        self.roots
            .iter()
            .filter_map(|name| self.snapshot_group(name, contacts))
            .collect()
    }

    fn snapshot_group(
        &self,
        full_name: &str,
        contacts: &HashMap<BareJid, Contact>,
    ) -> Option<ContactGroup> {
        let node = self.nodes.get(full_name)?;
        let mut members: Vec<Contact> = node
            .contacts
            .iter()
            .filter_map(|jid| contacts.get(jid).cloned())
            .collect();
        members.sort();
        Some(ContactGroup {
            name: node.name.clone(),
            full_name: full_name.to_owned(),
            parent: node.parent.clone(),
            groups: node
                .children
                .iter()
                .filter_map(|child| self.snapshot_group(child, contacts))
                .collect(),
            contacts: members,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jid(s: &str) -> BareJid {
        BareJid::new(s).unwrap()
    }

    fn groups(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| String::from(*name)).collect()
    }

    #[test]
    fn split() {
        assert_eq!(split_path("Friends/Close", Some("/")), ["Friends", "Close"]);
        assert_eq!(split_path("Friends/Close", None), ["Friends/Close"]);
        assert_eq!(split_path("/Friends//Close/", Some("/")), ["Friends", "Close"]);
        assert_eq!(split_path("a::b", Some("::")), ["a", "b"]);
        assert!(split_path("", None).is_empty());
    }

    #[test]
    fn nested_groups_are_pruned() {
        let romeo = jid("romeo@example.net");
        let mut contacts = HashMap::new();
        contacts.insert(romeo.clone(), Contact::new(romeo.clone()));
        let mut tree = GroupTree::default();
        tree.set_groups(&romeo, &groups(&["Friends/Close"]), Some("/"));

        let snapshot = tree.snapshot(&contacts);
        assert_eq!(snapshot.len(), 1);
        let friends = &snapshot[0];
        assert_eq!(friends.name, "Friends");
        assert!(friends.contacts.is_empty());
        let close = &friends.groups[0];
        assert_eq!(close.name, "Close");
        assert_eq!(close.full_name, "Friends/Close");
        assert_eq!(close.parent.as_deref(), Some("Friends"));
        assert_eq!(close.contacts[0].jid, romeo);
        assert_eq!(tree.depth("Friends/Close"), Some(1));

        tree.remove_contact(&romeo);
        assert!(tree.snapshot(&contacts).is_empty());
        assert!(!tree.contains("Friends"));
    }

    #[test]
    fn parent_with_contacts_is_kept() {
        let romeo = jid("romeo@example.net");
        let juliet = jid("juliet@example.com");
        let mut tree = GroupTree::default();
        tree.set_groups(&romeo, &groups(&["Friends/Close"]), Some("/"));
        tree.set_groups(&juliet, &groups(&["Friends"]), Some("/"));

        tree.set_groups(&romeo, &groups(&["Work"]), Some("/"));
        assert!(!tree.contains("Friends/Close"));
        assert!(tree.contains("Friends"));
        assert!(tree.contains("Work"));
        assert_eq!(tree.contacts_below("Friends"), HashSet::from([juliet.clone()]));

        tree.set_groups(&juliet, &[], Some("/"));
        assert!(!tree.contains("Friends"));
    }

    #[test]
    fn moving_up_to_parent() {
        let romeo = jid("romeo@example.net");
        let mut tree = GroupTree::default();
        tree.set_groups(&romeo, &groups(&["Friends/Close"]), Some("/"));
        tree.set_groups(&romeo, &groups(&["Friends"]), Some("/"));
        assert!(tree.contains("Friends"));
        assert!(!tree.contains("Friends/Close"));
        assert_eq!(tree.contacts_below("Friends"), HashSet::from([romeo]));
    }

    #[test]
    fn contacts_below() {
        let romeo = jid("romeo@example.net");
        let juliet = jid("juliet@example.com");
        let mut tree = GroupTree::default();
        tree.set_groups(&romeo, &groups(&["A/B/C", "A"]), Some("/"));
        tree.set_groups(&juliet, &groups(&["A/B"]), Some("/"));
        assert_eq!(tree.contacts_below("A").len(), 2);
        assert_eq!(tree.contacts_below("A/B/C"), HashSet::from([romeo]));
        assert_eq!(tree.parent("A/B/C"), Some("A/B"));
        assert_eq!(tree.depth("A/B/C"), Some(2));
        assert!(tree.contacts_below("Z").is_empty());
    }
}
