/// Dense 4-index tensor over sequence positions, stored as one contiguous
/// buffer. Indexing is ((i*n + d)*n + e)*n + j; no nested allocation.
#[derive(Debug, Clone)]
pub struct Tensor4 {
    n: usize,
    data: Vec<f64>,
}

impl Tensor4 {
    pub fn zeros(n: usize) -> Self {
        Tensor4 { n, data: vec![0.0; n * n * n * n] }
    }

    #[inline]
    fn idx(&self, i: usize, d: usize, e: usize, j: usize) -> usize {
        debug_assert!(i < self.n && d < self.n && e < self.n && j < self.n);
        ((i * self.n + d) * self.n + e) * self.n + j
    }

    #[inline]
    pub fn get(&self, i: usize, d: usize, e: usize, j: usize) -> f64 {
        self.data[self.idx(i, d, e, j)]
    }

    #[inline]
    pub fn add(&mut self, i: usize, d: usize, e: usize, j: usize, v: f64) {
        let at = self.idx(i, d, e, j);
        self.data[at] += v;
    }

    #[inline]
    pub fn set(&mut self, i: usize, d: usize, e: usize, j: usize, v: f64) {
        let at = self.idx(i, d, e, j);
        self.data[at] = v;
    }

    pub fn n(&self) -> usize {
        self.n
    }
}
