use self::pattern::{Pattern, Piece};
use crate::error::MatchError;
use crate::helpers;
use crate::params::Params;
use crate::route::{Leaf, ParamInfo};
use crate::Error;
use http::Method;
use std::collections::hash_map::{Entry, HashMap};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

pub(crate) mod pattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Static,
    Param,
    Wildcard,
}

/// A parameter node's declaration and the shared key its bindings use.
#[derive(Debug)]
pub(crate) struct NodeParam {
    key: Arc<str>,
    info: ParamInfo,
}

/// One edge-compressed node of the routing tree.
///
/// Static children are keyed by the first byte of their segment in `indices`;
/// at most one parameter (or catch-all) child hangs off `param_child`.
/// Segments are raw bytes so that a split may fall inside a multi-byte
/// character. The segments along any root-to-leaf path spell the registered
/// pattern with parameters rendered as `{name}`.
pub(crate) struct Node {
    pub(crate) segment: Vec<u8>,
    pub(crate) kind: NodeKind,
    pub(crate) indices: Vec<u8>,
    pub(crate) children: Vec<Node>,
    pub(crate) param_child: Option<Box<Node>>,
    pub(crate) leaves: Option<HashMap<Method, Leaf>>,
    pub(crate) param: Option<NodeParam>,
}

impl Default for Node {
    fn default() -> Node {
        Node {
            segment: Vec::new(),
            kind: NodeKind::Static,
            indices: Vec::new(),
            children: Vec::new(),
            param_child: None,
            leaves: None,
            param: None,
        }
    }
}

impl Node {
    fn for_param(info: &ParamInfo) -> Node {
        Node {
            segment: info.segment().into_bytes(),
            kind: if info.catch_all {
                NodeKind::Wildcard
            } else {
                NodeKind::Param
            },
            param: Some(NodeParam {
                key: Arc::from(info.name.as_str()),
                info: info.clone(),
            }),
            ..Node::default()
        }
    }

    /// Registers `leaf` under `pattern`.
    ///
    /// Fails on a second registration of the same method and pattern, and
    /// when the pattern declares a parameter that differs from the one
    /// already living at the same position.
    pub(crate) fn insert(&mut self, pattern: &Pattern, leaf: Leaf) -> crate::Result<&mut Leaf> {
        match pattern.pieces.split_first() {
            Some((Piece::Static(text), rest)) => self.insert_static(text.as_bytes(), rest, pattern, leaf),
            _ => Err(Error::InvalidPattern {
                pattern: pattern.raw.clone(),
                reason: "pattern should start with '/'".to_owned(),
            }),
        }
    }

    /// Consumes `text` at this static node, splitting it when `text` diverges
    /// from the segment part way through.
    fn insert_static(
        &mut self,
        text: &[u8],
        rest: &[Piece],
        pattern: &Pattern,
        leaf: Leaf,
    ) -> crate::Result<&mut Leaf> {
        if self.segment.is_empty() {
            self.segment = text.to_vec();
            return self.insert_after(rest, pattern, leaf);
        }

        let i = helpers::common_prefix_len(&self.segment, text);
        self.split_at(i);
        self.insert_text(&text[i..], rest, pattern, leaf)
    }

    /// Moves `segment[index..]`, together with everything below this node,
    /// into a new single child.
    fn split_at(&mut self, index: usize) {
        if index >= self.segment.len() {
            return;
        }
        let next = Node {
            segment: self.segment.split_off(index),
            kind: NodeKind::Static,
            indices: std::mem::take(&mut self.indices),
            children: std::mem::take(&mut self.children),
            param_child: self.param_child.take(),
            leaves: self.leaves.take(),
            param: None,
        };
        self.indices = vec![next.segment[0]];
        self.children = vec![next];
    }

    /// Continues with literal `text` below this node.
    fn insert_text(&mut self, text: &[u8], rest: &[Piece], pattern: &Pattern, leaf: Leaf) -> crate::Result<&mut Leaf> {
        let first = match text.first() {
            Some(b) => *b,
            None => return self.insert_after(rest, pattern, leaf),
        };
        let index = match self.indices.iter().position(|b| *b == first) {
            Some(index) => index,
            None => {
                self.indices.push(first);
                self.children.push(Node::default());
                self.children.len() - 1
            }
        };
        self.children[index].insert_static(text, rest, pattern, leaf)
    }

    /// Continues with the remaining pieces once this node's own text is consumed.
    fn insert_after(&mut self, rest: &[Piece], pattern: &Pattern, leaf: Leaf) -> crate::Result<&mut Leaf> {
        match rest.split_first() {
            None => self.attach(leaf),
            Some((Piece::Static(text), rest)) => self.insert_text(text.as_bytes(), rest, pattern, leaf),
            Some((Piece::Param(info), rest)) => {
                let child = self.param_child.get_or_insert_with(|| Box::new(Node::for_param(info)));
                if let Some(existing) = &child.param {
                    if !existing.info.same_as(info) {
                        return Err(Error::ParamConflict {
                            pattern: pattern.raw.clone(),
                            existing: existing.info.declaration(),
                            new: info.declaration(),
                        });
                    }
                }
                child.insert_after(rest, pattern, leaf)
            }
        }
    }

    fn attach(&mut self, leaf: Leaf) -> crate::Result<&mut Leaf> {
        let leaves = self.leaves.get_or_insert_with(HashMap::new);
        match leaves.entry(leaf.method().clone()) {
            Entry::Occupied(_) => Err(Error::DuplicateRoute {
                method: leaf.method().clone(),
                path: leaf.path().to_owned(),
            }),
            Entry::Vacant(slot) => Ok(slot.insert(leaf)),
        }
    }

    /// Resolves `path` for `method`, binding parameters into `params`.
    ///
    /// At every branch the static child chosen by the next byte wins over the
    /// parameter child, and a failure further down is final: the other branch
    /// is never retried.
    pub(crate) fn find<'n>(&'n self, method: &Method, path: &str, params: &mut Params) -> Result<&'n Leaf, MatchError> {
        params.clear();
        let bytes = path.as_bytes();
        let mut pos = 0;
        let mut node = self;

        loop {
            match node.kind {
                NodeKind::Static => {
                    if !bytes[pos..].starts_with(&node.segment) {
                        return Err(MatchError::NotFound);
                    }
                    pos += node.segment.len();
                }
                NodeKind::Param => {
                    let end = bytes[pos..]
                        .iter()
                        .position(|b| *b == b'/')
                        .map_or(bytes.len(), |i| pos + i);
                    node.bind(path, pos, end, params)?;
                    pos = end;
                }
                NodeKind::Wildcard => {
                    node.bind(path, pos, bytes.len(), params)?;
                    pos = bytes.len();
                }
            }

            if pos == bytes.len() {
                return node.leaf_for(method);
            }

            let next = bytes[pos];
            node = match node.indices.iter().position(|b| *b == next) {
                Some(i) => &node.children[i],
                None => match &node.param_child {
                    Some(child) => &**child,
                    None => return Err(MatchError::NotFound),
                },
            };
        }
    }

    fn bind(&self, path: &str, start: usize, end: usize, params: &mut Params) -> Result<(), MatchError> {
        let param = self.param.as_ref().ok_or(MatchError::NotFound)?;
        let value = path
            .get(start..end)
            .filter(|value| param.info.accepts(value))
            .ok_or(MatchError::NotFound)?;
        params.push(param.key.clone(), value);
        Ok(())
    }

    fn leaf_for(&self, method: &Method) -> Result<&Leaf, MatchError> {
        let leaves = match &self.leaves {
            Some(leaves) if !leaves.is_empty() => leaves,
            _ => return Err(MatchError::NotFound),
        };
        leaves.get(method).ok_or_else(|| {
            let mut allowed: Vec<Method> = leaves.keys().cloned().collect();
            allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            MatchError::MethodNotAllowed(allowed)
        })
    }

    /// The largest number of parameters a single route below this node binds.
    pub(crate) fn max_params(&self) -> usize {
        let own = usize::from(self.param.is_some());
        let below = self
            .children
            .iter()
            .chain(self.param_child.as_deref())
            .map(Node::max_params)
            .max()
            .unwrap_or(0);
        own + below
    }

    /// Collects every leaf: this node's (ordered by method), then the static
    /// children in index order, then the parameter child.
    pub(crate) fn collect_leaves<'n>(&'n self, out: &mut Vec<&'n Leaf>) {
        if let Some(leaves) = &self.leaves {
            let start = out.len();
            out.extend(leaves.values());
            out[start..].sort_by(|a, b| a.method().as_str().cmp(b.method().as_str()));
        }
        for child in self.children.iter().chain(self.param_child.as_deref()) {
            child.collect_leaves(out);
        }
    }
}

impl Debug for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("segment", &String::from_utf8_lossy(&self.segment))
            .field("kind", &self.kind)
            .field("indices", &String::from_utf8_lossy(&self.indices))
            .field("children", &self.children)
            .field("param_child", &self.param_child)
            .field("leaves", &self.leaves.as_ref().map(|l| l.keys().collect::<Vec<_>>()))
            .finish()
    }
}
