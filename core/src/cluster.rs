use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, info};

use crate::model::Item;
use crate::signature::{extract_signature, DocumentFrequencies};
use crate::trie::Trie;

#[derive(Debug, Clone)]
pub struct ClusterParams {
    /// Signatures with at most this many tokens bypass the trie and cluster
    /// under themselves; too generic to sub-cluster usefully.
    pub signature_threshold: usize,
    /// Sort signatures rarest-token-first instead of the default
    /// common-token-first order.
    pub reverse: bool,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            signature_threshold: 2,
            reverse: false,
        }
    }
}

/// Output of the clustering pass. All three maps are keyed by the
/// space-joined prefix string except `prefixes`, which maps caption text to
/// its prefix.
#[derive(Debug, Default)]
pub struct Clustering {
    /// Caption text -> assigned prefix.
    pub prefixes: HashMap<String, String>,
    /// Prefix -> accumulated weight: sum of max(1, retweets) per caption.
    pub prefix_weights: HashMap<String, u64>,
    /// Prefix -> caption texts assigned to it.
    pub clusters: BTreeMap<String, BTreeSet<String>>,
}

impl Clustering {
    pub fn prefix_of(&self, caption_text: &str) -> Option<&str> {
        self.prefixes.get(caption_text).map(String::as_str)
    }

    /// Heaviest prefix and its weight, if any captions were clustered.
    pub fn most_frequent(&self) -> Option<(&str, u64)> {
        self.prefix_weights
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(prefix, weight)| (prefix.as_str(), *weight))
    }
}

/// Assign every caption of `items` to exactly one prefix.
///
/// Two full corpus passes: the first builds the document-frequency table and
/// the trie (leaf markings require every signature to be known before any
/// shortest-prefix lookup), the second computes each caption's prefix and
/// accumulates weight and membership. `retweets` maps image file identifiers
/// to retweet counts; missing entries weigh 1.
pub fn cluster_captions(
    items: &[Item],
    retweets: &HashMap<String, u64>,
    params: &ClusterParams,
) -> Clustering {
    // Pass 1a: document frequencies over every caption.
    let mut dfs = DocumentFrequencies::new();
    for item in items {
        for caption in &item.captions {
            dfs.add_caption(&caption.caption);
        }
    }
    info!(
        num_items = items.len(),
        num_captions = dfs.num_captions(),
        num_tokens = dfs.num_tokens(),
        "document frequencies built"
    );

    // Pass 1b: trie over every signature long enough to sub-cluster.
    let mut trie = Trie::new();
    for item in items {
        for caption in &item.captions {
            let signature = extract_signature(&caption.caption, &dfs, params.reverse);
            if signature.len() <= params.signature_threshold {
                continue;
            }
            trie.insert(&signature);
        }
    }
    debug!(num_nodes = trie.len(), "trie built");

    // Pass 2: prefix assignment and accumulation.
    let mut clustering = Clustering::default();
    for item in items {
        let weight = retweets.get(&item.file).copied().unwrap_or(0).max(1);

        for caption in &item.captions {
            let signature = extract_signature(&caption.caption, &dfs, params.reverse);
            let prefix_tokens = if signature.len() <= params.signature_threshold {
                signature
            } else {
                trie.shortest_prefix(&signature)
            };
            let prefix = prefix_tokens.join(" ");

            clustering
                .prefixes
                .insert(caption.caption.clone(), prefix.clone());
            *clustering.prefix_weights.entry(prefix.clone()).or_insert(0) += weight;
            clustering
                .clusters
                .entry(prefix)
                .or_default()
                .insert(caption.caption.clone());
        }
    }
    info!(num_clusters = clustering.clusters.len(), "captions clustered");

    clustering
}
