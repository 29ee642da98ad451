//! Knot insertion, knot removal and degree elevation on raw control vectors.
//! Every routine expects a padded knot vector (`points.len() + degree + 1` knots)
//! and works on homogeneous or euclidean vectors alike.

use itertools::Itertools;
use nalgebra::DVector;

use crate::misc::{real, Binomial, FloatingPoint};

/// Insert `u` into the knot vector `times` times.
/// `u` must lie in `[knots[degree], knots[n + 1])` and its multiplicity plus `times`
/// must not exceed `degree`.
pub(crate) fn insert_knot<T: FloatingPoint>(
    degree: usize,
    knots: &[T],
    points: &[DVector<T>],
    u: T,
    times: usize,
) -> (Vec<T>, Vec<DVector<T>>) {
    if times == 0 {
        return (knots.to_vec(), points.to_vec());
    }

    let p = degree;
    let np = points.len() - 1;
    let mp = np + p + 1;
    let k = knots.iter().rposition(|t| *t <= u).unwrap_or(p);
    let s = knots.iter().filter(|t| **t == u).count();

    let mut knots_post = Vec::with_capacity(knots.len() + times);
    knots_post.extend_from_slice(&knots[..=k]);
    knots_post.extend(std::iter::repeat_n(u, times));
    knots_post.extend_from_slice(&knots[(k + 1)..=mp]);

    let mut points_post = vec![DVector::zeros(points[0].len()); np + times + 1];
    points_post[..=(k - p)].clone_from_slice(&points[..=(k - p)]);
    for i in (k - s)..=np {
        points_post[i + times] = points[i].clone();
    }

    let mut rw: Vec<DVector<T>> = points[(k - p)..=(k - s)].to_vec();
    for j in 1..=times {
        let l = k - p + j;
        for i in 0..=(p - j - s) {
            let alpha = (u - knots[l + i]) / (knots[i + k + 1] - knots[l + i]);
            rw[i] = &rw[i + 1] * alpha + &rw[i] * (T::one() - alpha);
        }
        points_post[l] = rw[0].clone();
        points_post[k + times - j - s] = rw[p - j - s].clone();
    }
    let l = k - p + times;
    for i in (l + 1)..(k - s) {
        points_post[i] = rw[i - l].clone();
    }

    (knots_post, points_post)
}

/// Remove one occurrence of the interior knot at index `r`.
/// `r` is the last index of its run of equal knots.
/// The new control points are swept in from both ends; where the sweeps meet,
/// the two candidates are averaged, so the removal is approximate for knots
/// that are not removable.
pub(crate) fn remove_knot<T: FloatingPoint>(
    degree: usize,
    knots: &[T],
    points: &[DVector<T>],
    r: usize,
) -> (Vec<T>, Vec<DVector<T>>) {
    let p = degree;
    let order = p + 1;
    let u = knots[r];
    let s = knots.iter().filter(|t| **t == u).count();
    let first = r - p;
    let last = r - s;
    let off = first - 1;

    let mut temp = vec![DVector::zeros(points[0].len()); last - off + 2];
    temp[0] = points[off].clone();
    temp[last + 1 - off] = points[last + 1].clone();

    let (mut i, mut j) = (first, last);
    let (mut ii, mut jj) = (1, last - off);
    while j > i {
        let alfi = (u - knots[i]) / (knots[i + order] - knots[i]);
        let alfj = (u - knots[j]) / (knots[j + order] - knots[j]);
        temp[ii] = (&points[i] - &temp[ii - 1] * (T::one() - alfi)) / alfi;
        temp[jj] = (&points[j] - &temp[jj + 1] * alfj) / (T::one() - alfj);
        i += 1;
        ii += 1;
        j -= 1;
        jj -= 1;
    }

    if j < i {
        // both sweeps produced the control point at the seam
        let seam = (&temp[ii - 1] + &temp[jj + 1]) * real::<T>(0.5);
        temp[ii - 1] = seam.clone();
        temp[jj + 1] = seam;
    }

    let mut points_post = points.to_vec();
    let (mut i, mut j) = (first, last);
    while j > i {
        points_post[i] = temp[i - off].clone();
        points_post[j] = temp[j - off].clone();
        i += 1;
        j -= 1;
    }
    points_post.remove((first + last) / 2);

    let mut knots_post = knots.to_vec();
    knots_post.remove(r);

    (knots_post, points_post)
}

/// Raise the degree by `inc`.
/// The knot vector must be clamped at both ends.
pub(crate) fn elevate_degree<T: FloatingPoint>(
    degree: usize,
    knots: &[T],
    points: &[DVector<T>],
    inc: usize,
) -> (Vec<T>, Vec<DVector<T>>) {
    if inc == 0 {
        return (knots.to_vec(), points.to_vec());
    }

    let p = degree;
    let n = points.len() - 1;
    let m = n + p + 1;
    let ph = p + inc;
    let ph2 = ph / 2;
    let zero = DVector::<T>::zeros(points[0].len());

    // coefficients of the bezier degree elevation
    let mut binom = Binomial::<T>::new();
    let mut bezalfs = vec![vec![T::zero(); p + 1]; ph + 1];
    bezalfs[0][0] = T::one();
    bezalfs[ph][p] = T::one();
    for i in 1..=ph2 {
        let inv = T::one() / binom.get(ph, i);
        for j in i.saturating_sub(inc)..=p.min(i) {
            bezalfs[i][j] = inv * binom.get(p, j) * binom.get(inc, i - j);
        }
    }
    for i in (ph2 + 1)..ph {
        for j in i.saturating_sub(inc)..=p.min(i) {
            bezalfs[i][j] = bezalfs[ph - i][p - j];
        }
    }

    let segments = knots.iter().dedup().count() - 1;
    let capacity = n + 1 + inc * segments;
    let mut qw = vec![zero.clone(); capacity];
    let mut uh = vec![T::zero(); capacity + ph + 1];

    let mut bpts = points[..=p].to_vec();
    let mut ebpts = vec![zero.clone(); ph + 1];
    let mut next_bpts = vec![zero.clone(); p.max(1)];
    let mut alfs = vec![T::zero(); p.max(1)];

    let mut mh = ph;
    let mut kind = ph + 1;
    let mut r: isize = -1;
    let mut a = p;
    let mut b = p + 1;
    let mut cind = 1;
    let mut ua = knots[0];
    qw[0] = points[0].clone();
    uh[..=ph].fill(ua);

    while b < m {
        let i = b;
        while b < m && knots[b] == knots[b + 1] {
            b += 1;
        }
        let mul = b - i + 1;
        mh += mul + inc;
        let ub = knots[b];
        let oldr = r;
        r = p as isize - mul as isize;
        let lbz = if oldr > 0 { ((oldr + 2) / 2) as usize } else { 1 };
        let rbz = if r > 0 { ph - ((r + 1) / 2) as usize } else { ph };

        // insert ub r times to isolate the bezier segment
        if r > 0 {
            let numer = ub - ua;
            for k in ((mul + 1)..=p).rev() {
                alfs[k - mul - 1] = numer / (knots[a + k] - ua);
            }
            for j in 1..=(r as usize) {
                let save = r as usize - j;
                let s = mul + j;
                for k in (s..=p).rev() {
                    bpts[k] = &bpts[k] * alfs[k - s] + &bpts[k - 1] * (T::one() - alfs[k - s]);
                }
                next_bpts[save] = bpts[p].clone();
            }
        }

        // elevate the bezier segment
        for i in lbz..=ph {
            let mut e = zero.clone();
            for j in i.saturating_sub(inc)..=p.min(i) {
                e += &bpts[j] * bezalfs[i][j];
            }
            ebpts[i] = e;
        }

        // remove ua oldr times
        if oldr > 1 {
            let mut first = kind as isize - 2;
            let mut last = kind as isize;
            let den = ub - ua;
            let bet = (ub - uh[kind - 1]) / den;
            for tr in 1..oldr {
                let mut i = first;
                let mut j = last;
                let mut kj = j - kind as isize + 1;
                while j - i > tr {
                    if i < cind as isize {
                        let iu = i as usize;
                        let alf = (ub - uh[iu]) / (ua - uh[iu]);
                        qw[iu] = &qw[iu] * alf + &qw[iu - 1] * (T::one() - alf);
                    }
                    if j >= lbz as isize {
                        let k = kj as usize;
                        let coef = if j - tr <= kind as isize - ph as isize + oldr {
                            (ub - uh[(j - tr) as usize]) / den
                        } else {
                            bet
                        };
                        ebpts[k] = &ebpts[k] * coef + &ebpts[k + 1] * (T::one() - coef);
                    }
                    i += 1;
                    j -= 1;
                    kj -= 1;
                }
                first -= 1;
                last += 1;
            }
        }

        if a != p {
            for _ in 0..(ph as isize - oldr) {
                uh[kind] = ua;
                kind += 1;
            }
        }

        for e in ebpts.iter().take(rbz + 1).skip(lbz) {
            qw[cind] = e.clone();
            cind += 1;
        }

        if b < m {
            let ur = r.max(0) as usize;
            bpts[..ur].clone_from_slice(&next_bpts[..ur]);
            for j in ur..=p {
                bpts[j] = points[b - p + j].clone();
            }
            a = b;
            b += 1;
            ua = ub;
        } else {
            uh[kind..=(kind + ph)].fill(ub);
        }
    }

    let nh = mh - ph - 1;
    qw.truncate(nh + 1);
    uh.truncate(nh + ph + 2);
    (uh, qw)
}
