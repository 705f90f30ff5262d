//! Segment trie used by the router, one per HTTP method.
//!
//! Nodes live in an arena (`Vec<Node<T>>`) and refer to each other by index,
//! so the parent link needed for parameter extraction does not create an
//! ownership cycle. For `/user/name` and `/user/:id/name` the tree is:
//!
//! ```text
//! ""                 (root)
//! └── USER
//!     ├── NAME       terminal
//!     └── :id
//!         └── NAME   terminal
//! ```
//!
//! Literal segments are stored uppercased so matching is case-insensitive.
//! Wildcard segments (`:name`) are stored untouched and match any literal.
//! Children are tried in insertion order and the first complete match wins.

use std::collections::HashMap;

use crate::error::Error;

/// Prefix marking a wildcard segment.
pub(crate) const PARAM_MARKER: char = ':';

type NodeId = usize;

const ROOT: NodeId = 0;

struct Node<T> {
    segment: String,
    /// `Some` iff a route terminates here.
    value: Option<T>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl<T> Node<T> {
    fn new(segment: String, parent: Option<NodeId>) -> Self {
        Self { segment, value: None, children: Vec::new(), parent }
    }
}

/// A trie over `/`-separated path segments.
pub(crate) struct Trie<T> {
    nodes: Vec<Node<T>>,
}

impl<T> Trie<T> {
    pub(crate) fn new() -> Self {
        Self { nodes: vec![Node::new(String::new(), None)] }
    }

    /// Registers `value` under `pattern`.
    ///
    /// The conflict check runs before any node is created, so a rejected
    /// registration leaves the tree untouched.
    pub(crate) fn insert(&mut self, pattern: &str, value: T) -> Result<(), Error> {
        let segments: Vec<String> = split(pattern).into_iter().map(normalize).collect();
        if self.find_equivalent(ROOT, &segments).is_some() {
            return Err(Error::RouteExists(pattern.to_owned()));
        }

        let mut current = ROOT;
        for segment in segments {
            let existing = self.nodes[current]
                .children
                .iter()
                .copied()
                .find(|&child| self.nodes[child].segment == segment);
            current = match existing {
                Some(child) => child,
                None => self.push_child(current, segment),
            };
        }
        self.nodes[current].value = Some(value);
        Ok(())
    }

    /// Finds the terminal node matching a concrete request path.
    pub(crate) fn lookup(&self, path: &str) -> Option<NodeId> {
        let segments: Vec<String> = split(path).into_iter().map(str::to_uppercase).collect();
        self.descend(ROOT, &segments)
    }

    pub(crate) fn value(&self, node: NodeId) -> Option<&T> {
        self.nodes.get(node)?.value.as_ref()
    }

    /// Pairs every wildcard on the way from `node` up to the root with the
    /// path segment at the same depth. Values keep the case they were sent with.
    pub(crate) fn params(&self, node: NodeId, path: &str) -> HashMap<String, String> {
        let mut params = HashMap::new();
        let mut current = node;
        for segment in split(path).into_iter().rev() {
            let node = &self.nodes[current];
            if let Some(name) = node.segment.strip_prefix(PARAM_MARKER) {
                params.insert(name.to_owned(), segment.to_owned());
            }
            match node.parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        params
    }

    fn push_child(&mut self, parent: NodeId, segment: String) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(segment, Some(parent)));
        self.nodes[parent].children.push(id);
        id
    }

    fn descend(&self, node: NodeId, segments: &[String]) -> Option<NodeId> {
        let Some((head, rest)) = segments.split_first() else {
            return self.nodes[node].value.is_some().then_some(node);
        };
        self.nodes[node]
            .children
            .iter()
            .copied()
            .filter(|&child| {
                let segment = &self.nodes[child].segment;
                is_wild(segment) || segment == head
            })
            .find_map(|child| self.descend(child, rest))
    }

    /// Looks for a terminal node that would compete with `segments` for the
    /// same requests: literals must be equal, and a wildcard on either side
    /// matches anything.
    fn find_equivalent(&self, node: NodeId, segments: &[String]) -> Option<NodeId> {
        let Some((head, rest)) = segments.split_first() else {
            return self.nodes[node].value.is_some().then_some(node);
        };
        self.nodes[node]
            .children
            .iter()
            .copied()
            .filter(|&child| {
                let segment = &self.nodes[child].segment;
                is_wild(head) || is_wild(segment) || segment == head
            })
            .find_map(|child| self.find_equivalent(child, rest))
    }
}

impl<T> Default for Trie<T> {
    fn default() -> Self { Self::new() }
}

fn is_wild(segment: &str) -> bool {
    segment.starts_with(PARAM_MARKER)
}

fn normalize(segment: &str) -> String {
    if is_wild(segment) { segment.to_owned() } else { segment.to_uppercase() }
}

/// `"/user/42/"` → `["user", "42"]`; `"/"` and `""` → `[]`.
fn split(path: &str) -> Vec<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched<'a>(trie: &'a Trie<&'static str>, path: &str) -> Option<&'a str> {
        trie.lookup(path).and_then(|node| trie.value(node)).copied()
    }

    #[test]
    fn static_and_wildcard_routes() {
        let mut trie = Trie::new();
        trie.insert("/user/name", "name").unwrap();
        trie.insert("/user/:id/name", "id-name").unwrap();

        assert_eq!(matched(&trie, "/user/name"), Some("name"));

        let node = trie.lookup("/user/123/name").unwrap();
        assert_eq!(trie.value(node), Some(&"id-name"));
        let params = trie.params(node, "/user/123/name");
        assert_eq!(params.get("id").map(String::as_str), Some("123"));
        assert_eq!(params.len(), 1);

        assert!(trie.params(trie.lookup("/user/name").unwrap(), "/user/name").is_empty());
        assert_eq!(matched(&trie, "/user/42/other"), None);
    }

    #[test]
    fn literal_segments_are_uppercased() {
        let mut trie = Trie::<()>::new();
        trie.insert("/user/:id", ()).unwrap();

        assert_eq!(trie.nodes[ROOT].segment, "");
        let user = trie.nodes[ROOT].children[0];
        assert_eq!(trie.nodes[user].segment, "USER");
        let id = trie.nodes[user].children[0];
        assert_eq!(trie.nodes[id].segment, ":id");
        assert_eq!(trie.nodes[id].parent, Some(user));
    }

    #[test]
    fn matching_ignores_case() {
        let mut trie = Trie::new();
        trie.insert("/User/Login", "login").unwrap();
        assert_eq!(matched(&trie, "/user/login"), Some("login"));
        assert_eq!(matched(&trie, "/USER/LOGIN"), Some("login"));
    }

    #[test]
    fn param_values_keep_their_case() {
        let mut trie = Trie::new();
        trie.insert("/files/:name", "file").unwrap();
        let node = trie.lookup("/files/ReadMe").unwrap();
        assert_eq!(trie.params(node, "/files/ReadMe")["name"], "ReadMe");
    }

    #[test]
    fn duplicate_route_is_rejected_and_first_kept() {
        let mut trie = Trie::new();
        trie.insert("/user/login", "first").unwrap();

        let err = trie.insert("/USER/login/", "second").unwrap_err();
        assert!(matches!(err, Error::RouteExists(ref p) if p == "/USER/login/"));
        assert_eq!(matched(&trie, "/user/login"), Some("first"));
    }

    #[test]
    fn renamed_wildcard_is_a_duplicate() {
        let mut trie = Trie::new();
        trie.insert("/user/:id", "id").unwrap();
        assert!(trie.insert("/user/:name", "name").is_err());
        assert_eq!(trie.nodes.len(), 3);
    }

    #[test]
    fn wildcard_and_literal_at_the_same_end_conflict() {
        let mut trie = Trie::new();
        trie.insert("/subject/:id", "by-id").unwrap();
        assert!(matches!(trie.insert("/subject/list", "list"), Err(Error::RouteExists(_))));
        assert_eq!(matched(&trie, "/subject/list"), Some("by-id"));

        let mut trie = Trie::new();
        trie.insert("/user/name", "name").unwrap();
        assert!(trie.insert("/user/:id", "by-id").is_err());
        assert_eq!(matched(&trie, "/user/7"), None);

        // Different lengths never compete.
        trie.insert("/user/:id/name", "id-name").unwrap();
        assert_eq!(matched(&trie, "/user/7/name"), Some("id-name"));
    }

    #[test]
    fn backtracks_to_later_candidates() {
        let mut trie = Trie::new();
        trie.insert("/a/:x/one", "wild").unwrap();
        trie.insert("/a/b/two", "literal").unwrap();
        assert_eq!(matched(&trie, "/a/b/two"), Some("literal"));
        assert_eq!(matched(&trie, "/a/b/one"), Some("wild"));
    }

    #[test]
    fn intermediate_node_can_become_terminal() {
        let mut trie = Trie::new();
        trie.insert("/subject/list/all", "all").unwrap();
        assert_eq!(matched(&trie, "/subject/list"), None);

        trie.insert("/subject/list", "list").unwrap();
        assert_eq!(matched(&trie, "/subject/list"), Some("list"));
        assert_eq!(matched(&trie, "/subject/list/all"), Some("all"));
    }

    #[test]
    fn root_matches_only_the_empty_route() {
        let mut trie = Trie::new();
        trie.insert("/home", "home").unwrap();
        assert_eq!(matched(&trie, "/"), None);

        trie.insert("/", "root").unwrap();
        assert_eq!(matched(&trie, "/"), Some("root"));
        assert_eq!(matched(&trie, ""), Some("root"));
        assert!(trie.insert("", "again").is_err());
    }

    #[test]
    fn several_params_are_extracted() {
        let mut trie = Trie::new();
        trie.insert("/org/:org/repo/:repo", "repo").unwrap();
        let path = "/org/rust-lang/repo/cargo";
        let node = trie.lookup(path).unwrap();
        let params = trie.params(node, path);
        assert_eq!(params["org"], "rust-lang");
        assert_eq!(params["repo"], "cargo");
    }
}
