// Maximum weight matching among the maximum cardinality matchings of a general graph.
// Primal-dual blossom algorithm (Edmonds, with Galil's O(n^3) bookkeeping). Edge weights
// are integers, so every dual variable and slack stays integral.

use crate::Graph;

const NONE: usize = usize::MAX;

/// Returns the mate of every vertex, `None` for unmatched vertices.
///
/// The matching has maximum cardinality and, among those, maximum total edge weight.
/// Unweighted graphs therefore get a plain maximum cardinality matching.
pub fn maximum_matching(graph: &Graph) -> Vec<Option<u32>> {
    let mut edges = Vec::new();
    for (vx, v) in graph.vertices.iter().enumerate() {
        for e in v.edges.iter() {
            if vx < e.dst as usize {
                edges.push((vx, e.dst as usize, e.weight as i64));
            }
        }
    }
    if edges.is_empty() {
        return vec![None; graph.len()];
    }

    let mut matcher = Matcher::new(graph.len(), edges);
    matcher.solve();

    matcher
        .mate
        .iter()
        .map(|&p| if p == NONE { None } else { Some(matcher.endpoint[p] as u32) })
        .collect()
}

// Labels of top-level blossoms during a stage.
const FREE: u8 = 0;
const OUTER: u8 = 1;
const INNER: u8 = 2;
const SCANNED: u8 = 5;

/// Working state. Edge `k` has the two endpoints `2k` and `2k + 1`; indices
/// `0..n` are vertices and `n..2n` are non-trivial blossoms.
struct Matcher {
    n: usize,
    edges: Vec<(usize, usize, i64)>,
    endpoint: Vec<usize>,
    /// Remote endpoints of the edges incident to each vertex.
    neighbend: Vec<Vec<usize>>,
    /// The remote endpoint of the matched edge, per vertex.
    mate: Vec<usize>,
    label: Vec<u8>,
    /// The endpoint through which a blossom got its label.
    label_end: Vec<usize>,
    /// Top-level blossom containing each vertex.
    in_blossom: Vec<usize>,
    blossom_parent: Vec<usize>,
    blossom_childs: Vec<Vec<usize>>,
    blossom_base: Vec<usize>,
    /// `blossom_endps[b][i]` connects `blossom_childs[b][i]` to the next child.
    blossom_endps: Vec<Vec<usize>>,
    /// Least-slack edge to an outer blossom.
    best_edge: Vec<usize>,
    blossom_best_edges: Vec<Option<Vec<usize>>>,
    unused_blossoms: Vec<usize>,
    dual: Vec<i64>,
    allow_edge: Vec<bool>,
    queue: Vec<usize>,
}

impl Matcher {
    fn new(n: usize, edges: Vec<(usize, usize, i64)>) -> Self {
        let max_weight = edges.iter().map(|e| e.2).max().unwrap_or(0).max(0);
        let endpoint = (0..2 * edges.len())
            .map(|p| if p % 2 == 0 { edges[p / 2].0 } else { edges[p / 2].1 })
            .collect();
        let mut neighbend = vec![Vec::new(); n];
        for (k, &(i, j, _)) in edges.iter().enumerate() {
            neighbend[i].push(2 * k + 1);
            neighbend[j].push(2 * k);
        }
        let mut dual = vec![max_weight; n];
        dual.resize(2 * n, 0);
        let mut blossom_base = (0..n).collect::<Vec<_>>();
        blossom_base.resize(2 * n, NONE);
        let edge_count = edges.len();

        Self {
            n,
            edges,
            endpoint,
            neighbend,
            mate: vec![NONE; n],
            label: vec![FREE; 2 * n],
            label_end: vec![NONE; 2 * n],
            in_blossom: (0..n).collect(),
            blossom_parent: vec![NONE; 2 * n],
            blossom_childs: vec![Vec::new(); 2 * n],
            blossom_base,
            blossom_endps: vec![Vec::new(); 2 * n],
            best_edge: vec![NONE; 2 * n],
            blossom_best_edges: vec![None; 2 * n],
            unused_blossoms: (n..2 * n).collect(),
            dual,
            allow_edge: vec![false; edge_count],
            queue: Vec::new(),
        }
    }

    fn slack(&self, k: usize) -> i64 {
        let (i, j, w) = self.edges[k];
        self.dual[i] + self.dual[j] - 2 * w
    }

    fn leaves(&self, b: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![b];
        while let Some(t) = stack.pop() {
            if t < self.n {
                out.push(t);
            } else {
                stack.extend(self.blossom_childs[t].iter().rev());
            }
        }
        out
    }

    /// Labels the top-level blossom of `w` and, for an inner label, the blossom matched
    /// to its base.
    fn assign_label(&mut self, mut w: usize, mut label: u8, mut p: usize) {
        loop {
            let b = self.in_blossom[w];
            self.label[w] = label;
            self.label[b] = label;
            self.label_end[w] = p;
            self.label_end[b] = p;
            self.best_edge[w] = NONE;
            self.best_edge[b] = NONE;
            if label == OUTER {
                let leaves = self.leaves(b);
                self.queue.extend(leaves);
                return;
            }
            let matched = self.mate[self.blossom_base[b]];
            w = self.endpoint[matched];
            label = OUTER;
            p = matched ^ 1;
        }
    }

    /// Traces back from two outer vertices. Returns the base of the new blossom, or
    /// `NONE` when the trees are distinct and an augmenting path was found.
    fn scan_blossom(&mut self, mut v: usize, mut w: usize) -> usize {
        let mut path = Vec::new();
        let mut base = NONE;
        while v != NONE || w != NONE {
            let mut b = self.in_blossom[v];
            if self.label[b] & 4 != 0 {
                base = self.blossom_base[b];
                break;
            }
            path.push(b);
            self.label[b] = SCANNED;
            if self.label_end[b] == NONE {
                v = NONE;
            } else {
                v = self.endpoint[self.label_end[b]];
                b = self.in_blossom[v];
                v = self.endpoint[self.label_end[b]];
            }
            if w != NONE {
                std::mem::swap(&mut v, &mut w);
            }
        }
        for b in path {
            self.label[b] = OUTER;
        }
        base
    }

    fn add_blossom(&mut self, base: usize, k: usize) {
        let (v, w, _) = self.edges[k];
        let bb = self.in_blossom[base];
        let mut bv = self.in_blossom[v];
        let mut bw = self.in_blossom[w];
        let b = self.unused_blossoms.pop().expect("at most n/2 blossoms are nested");
        self.blossom_base[b] = base;
        self.blossom_parent[b] = NONE;
        self.blossom_parent[bb] = b;

        let mut path = Vec::new();
        let mut endps = Vec::new();
        while bv != bb {
            self.blossom_parent[bv] = b;
            path.push(bv);
            endps.push(self.label_end[bv]);
            bv = self.in_blossom[self.endpoint[self.label_end[bv]]];
        }
        path.push(bb);
        path.reverse();
        endps.reverse();
        endps.push(2 * k);
        while bw != bb {
            self.blossom_parent[bw] = b;
            path.push(bw);
            endps.push(self.label_end[bw] ^ 1);
            bw = self.in_blossom[self.endpoint[self.label_end[bw]]];
        }
        self.blossom_childs[b] = path.clone();
        self.blossom_endps[b] = endps;

        self.label[b] = OUTER;
        self.label_end[b] = self.label_end[bb];
        self.dual[b] = 0;
        for v in self.leaves(b) {
            if self.label[self.in_blossom[v]] == INNER {
                // Inner vertices become outer and must be scanned.
                self.queue.push(v);
            }
            self.in_blossom[v] = b;
        }

        let mut best_edge_to = vec![NONE; 2 * self.n];
        for &bv in path.iter() {
            let lists = match self.blossom_best_edges[bv].take() {
                Some(list) => vec![list],
                None => self
                    .leaves(bv)
                    .into_iter()
                    .map(|v| self.neighbend[v].iter().map(|p| p / 2).collect::<Vec<_>>())
                    .collect(),
            };
            for k in lists.into_iter().flatten() {
                let (i, j, _) = self.edges[k];
                let j = if self.in_blossom[j] == b { i } else { j };
                let bj = self.in_blossom[j];
                if bj != b
                    && self.label[bj] == OUTER
                    && (best_edge_to[bj] == NONE || self.slack(k) < self.slack(best_edge_to[bj]))
                {
                    best_edge_to[bj] = k;
                }
            }
            self.best_edge[bv] = NONE;
        }

        let list = best_edge_to.into_iter().filter(|&k| k != NONE).collect::<Vec<_>>();
        self.best_edge[b] = NONE;
        for &k in list.iter() {
            if self.best_edge[b] == NONE || self.slack(k) < self.slack(self.best_edge[b]) {
                self.best_edge[b] = k;
            }
        }
        self.blossom_best_edges[b] = Some(list);
    }

    fn expand_blossom(&mut self, b: usize, end_stage: bool) {
        let childs = self.blossom_childs[b].clone();
        for &s in childs.iter() {
            self.blossom_parent[s] = NONE;
            if s < self.n {
                self.in_blossom[s] = s;
            } else if end_stage && self.dual[s] == 0 {
                self.expand_blossom(s, end_stage);
            } else {
                for v in self.leaves(s) {
                    self.in_blossom[v] = s;
                }
            }
        }

        if !end_stage && self.label[b] == INNER {
            // Relabel the children on the even-length path from the entry child to the base.
            let len = childs.len() as isize;
            let endps = self.blossom_endps[b].clone();
            let entry_child = self.in_blossom[self.endpoint[self.label_end[b] ^ 1]];
            let mut j = position(&childs, entry_child) as isize;
            let (step, trick) = if j & 1 == 1 {
                j -= len;
                (1, 0)
            } else {
                (-1, 1)
            };
            let endp_at = |j: isize| endps[(j - trick as isize).rem_euclid(len) as usize];
            let child_at = |j: isize| childs[j.rem_euclid(len) as usize];

            let mut p = self.label_end[b];
            while j != 0 {
                self.label[self.endpoint[p ^ 1]] = FREE;
                self.label[self.endpoint[endp_at(j) ^ trick ^ 1]] = FREE;
                self.assign_label(self.endpoint[p ^ 1], INNER, p);
                self.allow_edge[endp_at(j) / 2] = true;
                j += step;
                p = endp_at(j) ^ trick;
                self.allow_edge[p / 2] = true;
                j += step;
            }

            let bv = child_at(j);
            let entry = self.endpoint[p ^ 1];
            self.label[entry] = INNER;
            self.label[bv] = INNER;
            self.label_end[entry] = p;
            self.label_end[bv] = p;
            self.best_edge[bv] = NONE;
            j += step;

            while child_at(j) != entry_child {
                let bv = child_at(j);
                if self.label[bv] == OUTER {
                    j += step;
                    continue;
                }
                let reached = self.leaves(bv).into_iter().find(|&v| self.label[v] != FREE);
                if let Some(v) = reached {
                    self.label[v] = FREE;
                    let matched = self.endpoint[self.mate[self.blossom_base[bv]]];
                    self.label[matched] = FREE;
                    self.assign_label(v, INNER, self.label_end[v]);
                }
                j += step;
            }
        }

        self.label[b] = FREE;
        self.label_end[b] = NONE;
        self.blossom_childs[b].clear();
        self.blossom_endps[b].clear();
        self.blossom_base[b] = NONE;
        self.blossom_best_edges[b] = None;
        self.best_edge[b] = NONE;
        self.unused_blossoms.push(b);
    }

    /// Swaps matched and unmatched edges inside `b` so that `v` becomes its base.
    fn augment_blossom(&mut self, b: usize, v: usize) {
        let mut t = v;
        while self.blossom_parent[t] != b {
            t = self.blossom_parent[t];
        }
        if t >= self.n {
            self.augment_blossom(t, v);
        }

        let childs = self.blossom_childs[b].clone();
        let endps = self.blossom_endps[b].clone();
        let len = childs.len() as isize;
        let i = position(&childs, t);
        let mut j = i as isize;
        let (step, trick) = if i & 1 == 1 {
            j -= len;
            (1, 0)
        } else {
            (-1, 1)
        };

        while j != 0 {
            j += step;
            let t = childs[j.rem_euclid(len) as usize];
            let p = endps[(j - trick as isize).rem_euclid(len) as usize] ^ trick;
            if t >= self.n {
                self.augment_blossom(t, self.endpoint[p]);
            }
            j += step;
            let t = childs[j.rem_euclid(len) as usize];
            if t >= self.n {
                self.augment_blossom(t, self.endpoint[p ^ 1]);
            }
            self.mate[self.endpoint[p]] = p ^ 1;
            self.mate[self.endpoint[p ^ 1]] = p;
        }

        self.blossom_childs[b].rotate_left(i);
        self.blossom_endps[b].rotate_left(i);
        self.blossom_base[b] = self.blossom_base[self.blossom_childs[b][0]];
        debug_assert_eq!(self.blossom_base[b], v);
    }

    /// Flips the augmenting path through edge `k` between two outer vertices.
    fn augment_matching(&mut self, k: usize) {
        let (v, w, _) = self.edges[k];
        for (mut s, mut p) in [(v, 2 * k + 1), (w, 2 * k)] {
            loop {
                let bs = self.in_blossom[s];
                if bs >= self.n {
                    self.augment_blossom(bs, s);
                }
                self.mate[s] = p;
                if self.label_end[bs] == NONE {
                    break;
                }
                let t = self.endpoint[self.label_end[bs]];
                let bt = self.in_blossom[t];
                s = self.endpoint[self.label_end[bt]];
                let j = self.endpoint[self.label_end[bt] ^ 1];
                if bt >= self.n {
                    self.augment_blossom(bt, j);
                }
                self.mate[j] = self.label_end[bt];
                p = self.label_end[bt] ^ 1;
            }
        }
    }

    fn solve(&mut self) {
        let n = self.n;
        // Every stage either augments the matching or proves it has maximum cardinality.
        for stage in 0..n {
            self.label.fill(FREE);
            self.best_edge.fill(NONE);
            for b in n..2 * n {
                self.blossom_best_edges[b] = None;
            }
            self.allow_edge.fill(false);
            self.queue.clear();

            for v in 0..n {
                if self.mate[v] == NONE && self.label[self.in_blossom[v]] == FREE {
                    self.assign_label(v, OUTER, NONE);
                }
            }

            let mut augmented = false;
            loop {
                while !augmented {
                    let Some(v) = self.queue.pop() else {
                        break;
                    };
                    augmented = self.scan_vertex(v);
                }
                if augmented {
                    break;
                }
                if !self.adjust_duals() {
                    break;
                }
            }

            if !augmented {
                log::trace!("matching: no augmenting path in stage {stage}");
                break;
            }

            for b in n..2 * n {
                if self.blossom_parent[b] == NONE
                    && self.blossom_base[b] != NONE
                    && self.label[b] == OUTER
                    && self.dual[b] == 0
                {
                    self.expand_blossom(b, true);
                }
            }
        }
    }

    /// Scans the edges of an outer vertex. Returns true if the matching was augmented.
    fn scan_vertex(&mut self, v: usize) -> bool {
        for idx in 0..self.neighbend[v].len() {
            let p = self.neighbend[v][idx];
            let k = p / 2;
            let w = self.endpoint[p];
            if self.in_blossom[v] == self.in_blossom[w] {
                continue;
            }

            let mut kslack = 0;
            if !self.allow_edge[k] {
                kslack = self.slack(k);
                if kslack <= 0 {
                    self.allow_edge[k] = true;
                }
            }

            let bw = self.in_blossom[w];
            if self.allow_edge[k] {
                if self.label[bw] == FREE {
                    self.assign_label(w, INNER, p ^ 1);
                } else if self.label[bw] == OUTER {
                    let base = self.scan_blossom(v, w);
                    if base != NONE {
                        self.add_blossom(base, k);
                    } else {
                        self.augment_matching(k);
                        return true;
                    }
                } else if self.label[w] == FREE {
                    self.label[w] = INNER;
                    self.label_end[w] = p ^ 1;
                }
            } else if self.label[bw] == OUTER {
                let b = self.in_blossom[v];
                if self.best_edge[b] == NONE || kslack < self.slack(self.best_edge[b]) {
                    self.best_edge[b] = k;
                }
            } else if self.label[w] == FREE
                && (self.best_edge[w] == NONE || kslack < self.slack(self.best_edge[w]))
            {
                self.best_edge[w] = k;
            }
        }
        false
    }

    /// Applies the smallest dual change that makes progress. Returns false once no
    /// further progress is possible in this stage.
    fn adjust_duals(&mut self) -> bool {
        enum Delta {
            Edge(usize),
            HalfEdge(usize),
            Expand(usize),
        }
        let n = self.n;
        let mut best: Option<(i64, Delta)> = None;

        for v in 0..n {
            if self.label[self.in_blossom[v]] == FREE && self.best_edge[v] != NONE {
                let d = self.slack(self.best_edge[v]);
                if best.as_ref().map_or(true, |(delta, _)| d < *delta) {
                    best = Some((d, Delta::Edge(self.best_edge[v])));
                }
            }
        }
        for b in 0..2 * n {
            if self.blossom_parent[b] == NONE && self.label[b] == OUTER && self.best_edge[b] != NONE {
                let d = self.slack(self.best_edge[b]) / 2;
                if best.as_ref().map_or(true, |(delta, _)| d < *delta) {
                    best = Some((d, Delta::HalfEdge(self.best_edge[b])));
                }
            }
        }
        for b in n..2 * n {
            if self.blossom_base[b] != NONE
                && self.blossom_parent[b] == NONE
                && self.label[b] == INNER
                && best.as_ref().map_or(true, |(delta, _)| self.dual[b] < *delta)
            {
                best = Some((self.dual[b], Delta::Expand(b)));
            }
        }

        // Nothing left to grow: shift the vertex duals as far as they go and stop.
        let (delta, kind) = match best {
            Some((delta, kind)) => (delta, Some(kind)),
            None => (self.dual[..n].iter().copied().min().unwrap_or(0).max(0), None),
        };

        for v in 0..n {
            match self.label[self.in_blossom[v]] {
                OUTER => self.dual[v] -= delta,
                INNER => self.dual[v] += delta,
                _ => {}
            }
        }
        for b in n..2 * n {
            if self.blossom_base[b] != NONE && self.blossom_parent[b] == NONE {
                match self.label[b] {
                    OUTER => self.dual[b] += delta,
                    INNER => self.dual[b] -= delta,
                    _ => {}
                }
            }
        }

        match kind {
            None => false,
            Some(Delta::Edge(k)) => {
                self.allow_edge[k] = true;
                let (i, j, _) = self.edges[k];
                let outer = if self.label[self.in_blossom[i]] == FREE { j } else { i };
                self.queue.push(outer);
                true
            }
            Some(Delta::HalfEdge(k)) => {
                self.allow_edge[k] = true;
                self.queue.push(self.edges[k].0);
                true
            }
            Some(Delta::Expand(b)) => {
                self.expand_blossom(b, false);
                true
            }
        }
    }
}

fn position(childs: &[usize], child: usize) -> usize {
    childs
        .iter()
        .position(|&c| c == child)
        .expect("sub-blossom is a child of its parent")
}
