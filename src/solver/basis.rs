//! Chunked storage for the retained search directions of a truncated Krylov
//! method.
//!
//! Direction/image pairs (Pᵢ, Cᵢ = A Pᵢ) are allocated lazily in chunks so short
//! solves never pay for the full window, while slot addresses stay stable across
//! growth: chunks are append-only and a slot always resolves to the same inner
//! buffer once handed out. Slots are recycled modulo `mmax + 1`, matching the
//! truncation window of the solver.

use num_traits::Float;

struct BasisPair<T> {
    p: Vec<T>,
    c: Vec<T>,
}

pub struct BasisManager<T> {
    n: usize,
    mmax: usize,
    chunks: Vec<Vec<BasisPair<T>>>,
    slots: Vec<(usize, usize)>,
}

impl<T: Float> BasisManager<T> {
    /// `n` is the vector length; at most `mmax + 1` slots will ever exist.
    pub fn new(n: usize, mmax: usize) -> Self {
        Self { n, mmax, chunks: Vec::new(), slots: Vec::new() }
    }

    /// Number of slots currently allocated.
    pub fn nvecs(&self) -> usize {
        self.slots.len()
    }

    /// Slot holding the direction of iteration `i`.
    pub fn slot_of(&self, i: usize) -> usize {
        i % (self.mmax + 1)
    }

    /// Grow to hold at least `needed` slots (capped at `mmax + 1`), allocating at
    /// least `chunksize` new slots at a time to amortize growth.
    pub fn ensure_capacity(&mut self, needed: usize, chunksize: usize) {
        let cap = self.mmax + 1;
        let target = needed.min(cap);
        if self.slots.len() >= target {
            return;
        }
        let nnew = (target - self.slots.len()).max(chunksize).min(cap - self.slots.len());
        let chunk: Vec<BasisPair<T>> = (0..nnew)
            .map(|_| BasisPair { p: vec![T::zero(); self.n], c: vec![T::zero(); self.n] })
            .collect();
        let ci = self.chunks.len();
        for k in 0..nnew {
            self.slots.push((ci, k));
        }
        self.chunks.push(chunk);
    }

    pub fn p(&self, slot: usize) -> &[T] {
        let (ci, k) = self.slots[slot];
        &self.chunks[ci][k].p
    }

    pub fn p_mut(&mut self, slot: usize) -> &mut [T] {
        let (ci, k) = self.slots[slot];
        &mut self.chunks[ci][k].p
    }

    pub fn c(&self, slot: usize) -> &[T] {
        let (ci, k) = self.slots[slot];
        &self.chunks[ci][k].c
    }

    pub fn c_mut(&mut self, slot: usize) -> &mut [T] {
        let (ci, k) = self.slots[slot];
        &mut self.chunks[ci][k].c
    }

    /// Batched dots of `z` against the stored images: `out[j] = z · C_slots[j]`.
    pub fn mdot_c(&self, z: &[T], slots: &[usize]) -> Vec<T> {
        let mut out = vec![T::zero(); slots.len()];
        for (o, &s) in out.iter_mut().zip(slots) {
            let mut acc = T::zero();
            for (&zi, &ci) in z.iter().zip(self.c(s)) {
                acc = acc + zi * ci;
            }
            *o = acc;
        }
        out
    }

    /// `out += Σⱼ coeffs[j] · P_slots[j]`.
    pub fn maxpy_p(&self, out: &mut [T], coeffs: &[T], slots: &[usize]) {
        for (&a, &s) in coeffs.iter().zip(slots) {
            for (oi, &pi) in out.iter_mut().zip(self.p(s)) {
                *oi = *oi + a * pi;
            }
        }
    }
}
