use approx::assert_relative_eq;
use nalgebra::DVector;
use nurbs_kernel::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_curve(rng: &mut StdRng, order: usize, cv_count: usize, rational: bool) -> NurbsCurve<f64> {
    let points = (0..cv_count)
        .map(|_| DVector::from_fn(3, |_, _| rng.random_range(-5.0..5.0)))
        .collect::<Vec<_>>();
    let mut curve = NurbsCurve::try_clamped_uniform(3, order, &points, 1.).unwrap();
    if rational {
        for i in 0..cv_count {
            curve.set_weight(i, rng.random_range(0.5..2.0)).unwrap();
        }
    }
    curve
}

fn parameters(curve: &NurbsCurve<f64>, count: usize) -> Vec<f64> {
    let (t0, t1) = curve.domain();
    (0..=count)
        .map(|i| t0 + (t1 - t0) * i as f64 / count as f64)
        .collect()
}

#[test]
fn random_knot_insertion_keeps_shape() {
    let mut rng = StdRng::seed_from_u64(7);
    for order in 2..=5 {
        let original = random_curve(&mut rng, order, order + 3, order % 2 == 0);
        let mut curve = original.clone();
        let (t0, t1) = curve.domain();
        for _ in 0..4 {
            let value = rng.random_range(t0..t1);
            curve.try_insert_knot(value, 1).unwrap();
        }
        assert_eq!(curve.cv_count(), original.cv_count() + 4);
        assert!(curve.is_valid());
        for t in parameters(&original, 50) {
            assert_relative_eq!(curve.point_at(t), original.point_at(t), epsilon = 1e-9);
        }
    }
}

#[test]
fn end_weights_keep_image() {
    let mut rng = StdRng::seed_from_u64(11);
    let original = random_curve(&mut rng, 4, 7, true);
    let mut curve = original.clone();
    curve.try_change_end_weights(3., 0.25).unwrap();
    assert_relative_eq!(curve.weight(0).unwrap(), 3., epsilon = 1e-12);
    assert_relative_eq!(curve.weight(6).unwrap(), 0.25, epsilon = 1e-12);
    assert_eq!(curve.domain(), original.domain());

    let (t0, t1) = original.domain();
    assert_relative_eq!(curve.point_at(t0), original.point_at(t0), epsilon = 1e-10);
    assert_relative_eq!(curve.point_at(t1), original.point_at(t1), epsilon = 1e-10);
    // every point of the new curve lies on the original one
    let dense = parameters(&original, 8000)
        .into_iter()
        .map(|t| original.point_at(t))
        .collect::<Vec<_>>();
    for t in parameters(&curve, 25) {
        let p = curve.point_at(t);
        let distance = dense
            .iter()
            .map(|q| (q - &p).norm())
            .fold(f64::MAX, f64::min);
        assert!(distance < 0.05, "distance {} at {}", distance, t);
    }
}

#[test]
fn piecewise_bezier_keeps_parameterization() {
    let mut rng = StdRng::seed_from_u64(3);
    let original = random_curve(&mut rng, 4, 8, true);
    let mut curve = original.clone();
    curve.try_make_piecewise_bezier(false).unwrap();
    assert!(curve.has_bezier_spans());
    assert_eq!(curve.span_count(), original.span_count());
    for t in parameters(&original, 40) {
        assert_relative_eq!(curve.point_at(t), original.point_at(t), epsilon = 1e-9);
    }
    // spans are addressed by knot interval, the repeated knots give empty ones
    let knots = curve.knots().to_vec();
    let order = curve.order();
    let mut converted = 0;
    for i in 0..=(curve.cv_count() - order) {
        let (a, b) = (knots[order - 2 + i], knots[order - 1 + i]);
        match curve.try_convert_span_to_bezier(i) {
            Ok(bezier) => {
                converted += 1;
                assert_relative_eq!(
                    bezier.point_at(0.3),
                    curve.point_at(a + (b - a) * 0.3),
                    epsilon = 1e-9
                );
            }
            Err(NurbsError::OutOfDomain(_)) => assert_eq!(a, b),
            Err(e) => panic!("unexpected error {}", e),
        }
    }
    assert_eq!(converted, curve.span_count());
}

#[test]
fn append_then_elevate() {
    let mut rng = StdRng::seed_from_u64(5);
    let head = random_curve(&mut rng, 3, 5, false);
    let tail = random_curve(&mut rng, 4, 6, true);
    let mut joined = head.clone();
    joined.try_append(&tail).unwrap();
    assert!(joined.is_valid());
    assert_eq!(joined.order(), 4);

    let (h0, h1) = head.domain();
    let (_, t1) = tail.domain();
    let (j0, j1) = joined.domain();
    assert_eq!(j0, h0);
    assert_relative_eq!(j1, h1 + t1, epsilon = 1e-12);
    assert_relative_eq!(joined.point_at(j0), head.point_at(h0), epsilon = 1e-10);
    assert_relative_eq!(joined.point_at(j1), tail.point_at(t1), epsilon = 1e-10);

    let before = joined.clone();
    joined.try_increase_degree(6).unwrap();
    for t in parameters(&before, 30) {
        assert_relative_eq!(joined.point_at(t), before.point_at(t), epsilon = 1e-9);
    }
}
