use std::collections::HashMap;

#[derive(Debug, Default)]
struct Node {
    children: HashMap<String, usize>,
    leaf: bool,
}

/// Prefix tree over token sequences, stored as an arena of nodes addressed by
/// index. Node 0 is the root; the root is never marked leaf. Built once from
/// every signature in the corpus, then only queried.
#[derive(Debug)]
pub struct Trie {
    nodes: Vec<Node>,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    /// Insert a token sequence, marking its terminal node as a complete
    /// signature. Inserting an empty sequence is a no-op.
    pub fn insert(&mut self, tokens: &[String]) {
        if tokens.is_empty() {
            return;
        }

        let mut idx = 0;
        for token in tokens {
            idx = match self.nodes[idx].children.get(token) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[idx].children.insert(token.clone(), child);
                    child
                }
            };
        }
        self.nodes[idx].leaf = true;
    }

    /// Walk `tokens` in order and return the shortest prefix that ends on a
    /// node some complete signature terminates at. Stops when a token has no
    /// matching child (that token excluded), when the entered node is a leaf
    /// (that token included), or when the sequence is exhausted.
    pub fn shortest_prefix(&self, tokens: &[String]) -> Vec<String> {
        let mut prefix = Vec::new();
        let mut idx = 0;

        for token in tokens {
            match self.nodes[idx].children.get(token) {
                Some(&child) => {
                    prefix.push(token.clone());
                    if self.nodes[child].leaf {
                        break;
                    }
                    idx = child;
                }
                None => break,
            }
        }

        prefix
    }

    /// Number of nodes excluding the root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }
}
