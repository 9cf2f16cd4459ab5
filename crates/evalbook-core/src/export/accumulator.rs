use std::collections::HashMap;

/// Id-keyed nodes that remember first-seen order.
#[derive(Debug)]
pub(crate) struct Keyed<N> {
    index: HashMap<i64, usize>,
    nodes: Vec<N>,
}

impl<N> Default for Keyed<N> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            nodes: Vec::new(),
        }
    }
}

impl<N> Keyed<N> {
    pub(crate) fn contains(&self, id: i64) -> bool {
        self.index.contains_key(&id)
    }

    /// Stores `node` under `id` unless the id was already seen. Returns
    /// whether it was stored.
    pub(crate) fn record(&mut self, id: i64, node: N) -> bool {
        if self.contains(id) {
            return false;
        }
        self.index.insert(id, self.nodes.len());
        self.nodes.push(node);
        true
    }

    pub(crate) fn get(&self, id: i64) -> Option<&N> {
        self.index.get(&id).map(|&pos| &self.nodes[pos])
    }

    pub(crate) fn get_mut(&mut self, id: i64) -> Option<&mut N> {
        self.index.get(&id).map(|&pos| &mut self.nodes[pos])
    }

    /// The node for `id`, built with `make` on first sight.
    pub(crate) fn get_or_insert_with(&mut self, id: i64, make: impl FnOnce() -> N) -> &mut N {
        let pos = match self.index.get(&id) {
            Some(&pos) => pos,
            None => {
                self.index.insert(id, self.nodes.len());
                self.nodes.push(make());
                self.nodes.len() - 1
            }
        };
        &mut self.nodes[pos]
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn into_vec(self) -> Vec<N> {
        self.nodes
    }
}
