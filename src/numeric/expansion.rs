//! Error-free transformations and non-overlapping floating point expansions.
//!
//! An expansion is a list of f64 components sorted by increasing magnitude
//! whose exact sum is the represented value. Zero components are never stored.

/// `a + b = x + y` exactly.
#[inline]
pub(crate) fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let x = a + b;
    let b_virtual = x - a;
    let a_virtual = x - b_virtual;
    let b_round = b - b_virtual;
    let a_round = a - a_virtual;
    (x, a_round + b_round)
}

/// `a + b = x + y` exactly, requires `|a| >= |b|`.
#[inline]
pub(crate) fn fast_two_sum(a: f64, b: f64) -> (f64, f64) {
    let x = a + b;
    let b_virtual = x - a;
    (x, b - b_virtual)
}

/// `a * b = x + y` exactly (fused multiply-add recovers the rounding error).
#[inline]
pub(crate) fn two_product(a: f64, b: f64) -> (f64, f64) {
    let x = a * b;
    (x, a.mul_add(b, -x))
}

/// Add a single value to an expansion.
pub(crate) fn grow(e: &[f64], b: f64) -> Vec<f64> {
    let mut h = Vec::with_capacity(e.len() + 1);
    let mut q = b;
    for &component in e {
        let (sum, err) = two_sum(q, component);
        if err != 0.0 {
            h.push(err);
        }
        q = sum;
    }
    if q != 0.0 {
        h.push(q);
    }
    h
}

/// Exact sum of two expansions.
pub(crate) fn sum(e: &[f64], f: &[f64]) -> Vec<f64> {
    let (long, short) = if e.len() >= f.len() { (e, f) } else { (f, e) };
    let mut h = long.to_vec();
    for &component in short {
        h = grow(&h, component);
    }
    h
}

/// Exact product of an expansion and a single value.
pub(crate) fn scale(e: &[f64], b: f64) -> Vec<f64> {
    if e.is_empty() || b == 0.0 {
        return Vec::new();
    }

    let mut h = Vec::with_capacity(e.len() * 2);
    let (mut q, err) = two_product(e[0], b);
    if err != 0.0 {
        h.push(err);
    }
    for &component in &e[1..] {
        let (product_hi, product_lo) = two_product(component, b);
        let (partial, err) = two_sum(q, product_lo);
        if err != 0.0 {
            h.push(err);
        }
        let (next, err) = fast_two_sum(product_hi, partial);
        if err != 0.0 {
            h.push(err);
        }
        q = next;
    }
    if q != 0.0 {
        h.push(q);
    }
    h
}

/// Exact product of two expansions.
pub(crate) fn product(e: &[f64], f: &[f64]) -> Vec<f64> {
    let (long, short) = if e.len() >= f.len() { (e, f) } else { (f, e) };
    short
        .iter()
        .fold(Vec::new(), |acc, &b| sum(&acc, &scale(long, b)))
}

/// Renormalize so components are as few and as large as possible.
pub(crate) fn compress(e: &[f64]) -> Vec<f64> {
    if e.len() < 2 {
        return e.to_vec();
    }

    // top-down sweep, g ends up largest-first
    let mut g: Vec<f64> = Vec::with_capacity(e.len());
    let mut q = e[e.len() - 1];
    for &component in e[..e.len() - 1].iter().rev() {
        let (big, small) = fast_two_sum(q, component);
        if small != 0.0 {
            g.push(big);
            q = small;
        } else {
            q = big;
        }
    }

    // bottom-up sweep, h ends up smallest-first
    let mut h: Vec<f64> = Vec::with_capacity(g.len() + 1);
    for &component in g.iter().rev() {
        let (big, small) = fast_two_sum(component, q);
        if small != 0.0 {
            h.push(small);
        }
        q = big;
    }
    if q != 0.0 {
        h.push(q);
    }
    h
}

/// Sum of the components, smallest first.
#[inline]
pub(crate) fn estimate(e: &[f64]) -> f64 {
    e.iter().sum()
}
