/// Disjoint-set union over per-check segment ids, with path halving and
/// union by size.
///
/// Layers are unioned bottom-up, so two ids are in the same set iff they
/// are electrically connected through the layers processed so far; the
/// structure must not be queried for layers not yet unioned.
#[derive(Debug)]
pub struct Dsu {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl Dsu {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    pub fn find_set(&mut self, mut v: usize) -> usize {
        while self.parent[v] != v {
            self.parent[v] = self.parent[self.parent[v]];
            v = self.parent[v];
        }
        v
    }

    pub fn union_set(&mut self, u: usize, v: usize) {
        let mut ru = self.find_set(u);
        let mut rv = self.find_set(v);
        if ru == rv {
            return;
        }
        if self.size[ru] < self.size[rv] {
            std::mem::swap(&mut ru, &mut rv);
        }
        self.parent[rv] = ru;
        self.size[ru] += self.size[rv];
    }

    pub fn same(&mut self, u: usize, v: usize) -> bool {
        self.find_set(u) == self.find_set(v)
    }
}
