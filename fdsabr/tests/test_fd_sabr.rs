//! End-to-end checks of the density solver on the reference parameter set
//! `forward = 0.0488, α = 0.026, β = 0.5, ν = 0.4, ρ = −0.1, shift = 0.02,
//! T = 1` with `nd = 6`, `N = 100` and 100 time steps.

use approx::assert_abs_diff_eq;
use fdsabr::models::hagan_volatility;
use fdsabr::prelude::*;

fn reference() -> ModelParameters {
    ModelParameters::new(0.0488, 0.026, 0.5, 0.4, -0.1, 0.02, 1.0).unwrap()
}

fn solve(variant: SabrVariant) -> CachedSolution {
    build_density(reference(), FdSabrSettings::new(variant)).unwrap()
}

const VARIANTS: [SabrVariant; 2] = [SabrVariant::PositiveForward, SabrVariant::FreeBoundary];

// ───────────────────────── mass and positivity ─────────────────────────

#[test]
fn test_mass_conservation() {
    for v in VARIANTS {
        let s = solve(v);
        assert_abs_diff_eq!(s.total_mass(), 1.0, epsilon = 1e-3);
    }
}

#[test]
fn test_density_is_non_negative() {
    for v in VARIANTS {
        let s = solve(v);
        assert!(s.state().p.iter().all(|&p| p >= 0.0), "{v:?}");
        assert!(s.probability_density().iter().all(|&d| d >= 0.0), "{v:?}");
    }
}

#[test]
fn test_positive_forward_grid_stays_positive() {
    // low forward, zero shift: the lower boundary is pulled in to F = 0
    let p = ModelParameters::new(0.005, 0.03, 0.5, 0.4, -0.1, 0.0, 1.0).unwrap();
    let s = build_density(p, FdSabrSettings::new(SabrVariant::PositiveForward)).unwrap();
    let fm = &s.arrays().fm;
    for (i, f) in fm.iter().enumerate().take(s.grid().last_cell() + 1).skip(1) {
        assert!(*f > 0.0, "fm[{i}] = {f}");
    }

    let fb = build_density(p, FdSabrSettings::new(SabrVariant::FreeBoundary)).unwrap();
    assert!(fb.strike_nodes()[0] < 0.0);
    assert!(fb.density(&[-0.002])[0] > 0.0);
}

// ───────────────────────── prices ─────────────────────────

#[test]
fn test_call_prices_non_increasing() {
    for v in VARIANTS {
        let s = solve(v);
        let nodes = s.strike_nodes();
        let (lo, hi) = (nodes[0], nodes[nodes.len() - 1] + 0.01);
        let n = 300;
        let mut prev = s.price_call(lo);
        for i in 1..=n {
            let k = lo + (hi - lo) * i as f64 / n as f64;
            let c = s.price_call(k);
            assert!(c <= prev + 1e-12, "{v:?}: price rises to {c} at strike {k}");
            prev = c;
        }
    }
}

#[test]
fn test_boundary_consistency() {
    for v in VARIANTS {
        let s = solve(v);
        let p = s.params();
        let t = s.transform();
        let f_min = t.forward_of_z(p, s.grid().zmin) - p.shift;
        let f_max = t.forward_of_z(p, s.grid().zmax) - p.shift;

        let below = f_min - 1e-4;
        assert_eq!(s.price_call(below), p.forward - below);
        assert_eq!(s.price_call(f_max + 1e-4), 0.0);
        assert_eq!(s.price_call(f_max + 1.0), 0.0);
    }
}

#[test]
fn test_reference_atm_price_and_volatility() {
    let f = reference().forward;
    let atm_scale = 0.026 / f.powf(0.5);
    for v in VARIANTS {
        let s = solve(v);
        let c = s.price_call(f);
        assert!(c > 0.0 && c < f / 2.0, "{v:?}: ATM price {c}");

        let vol = s.volatility(&[f], VolatilityType::ShiftedLognormal)[0]
            .clone()
            .unwrap()
            .unwrap();
        assert!(
            vol >= 0.5 * atm_scale && vol <= 2.0 * atm_scale,
            "{v:?}: ATM vol {vol}"
        );
    }
}

#[test]
fn test_fd_smile_close_to_hagan_near_the_money() {
    let p = reference();
    let settings = FdSabrSettings::new(SabrVariant::PositiveForward)
        .with_grid_size(300)
        .with_timesteps(200);
    let s = build_density(p, settings).unwrap();
    let strikes = [0.035, 0.04, 0.0488, 0.055, 0.065];
    let fd = s.volatility(&strikes, VolatilityType::ShiftedLognormal);
    for (k, v) in strikes.iter().zip(fd) {
        let fd_vol = v.unwrap().unwrap();
        let hagan = hagan_volatility(&p, *k).unwrap();
        assert_abs_diff_eq!(fd_vol, hagan, epsilon = 3e-3);
    }
}

#[test]
fn test_free_boundary_prices_negative_strikes() {
    let p = ModelParameters::new(0.005, 0.03, 0.5, 0.4, -0.1, 0.0, 1.0).unwrap();
    let s = build_density(p, FdSabrSettings::new(SabrVariant::FreeBoundary)).unwrap();
    let k = -0.002;
    let c = s.price_call(k);
    // strictly above intrinsic: there is mass below the strike
    assert!(c > p.forward - k);
    // a lognormal quote does not exist below zero, a normal one does
    assert!(matches!(
        s.volatility(&[k], VolatilityType::ShiftedLognormal)[0],
        Err(Error::VolatilityInversionFailed { .. })
    ));
    assert!(matches!(
        s.volatility(&[k], VolatilityType::Normal)[0],
        Ok(Some(_))
    ));
}

// ───────────────────────── determinism and errors ─────────────────────────

#[test]
fn test_repeated_solves_are_bit_identical() {
    for v in VARIANTS {
        let a = solve(v);
        let b = solve(v);
        assert_eq!(a.state(), b.state());
        assert_eq!(a.state().pl.to_bits(), b.state().pl.to_bits());
        assert_eq!(a.state().pr.to_bits(), b.state().pr.to_bits());
    }
}

#[test]
fn test_not_ready_before_convergence() {
    let mut solver = FdSabrSolver::new(reference(), FdSabrSettings::default()).unwrap();
    assert_eq!(solver.price_call(0.05), Err(Error::NotReady));
    assert_eq!(solver.density(&[0.05]), Err(Error::NotReady));
    solver.step().unwrap();
    assert_eq!(solver.price_call(0.05), Err(Error::NotReady));
    solver.solve().unwrap();
    assert!(solver.price_call(0.05).is_ok());
}

#[test]
fn test_beta_one_is_invalid_domain() {
    let err = ModelParameters::new(0.0488, 0.026, 1.0, 0.4, -0.1, 0.02, 1.0).unwrap_err();
    assert!(matches!(err, Error::InvalidDomain(_)));

    let literal = ModelParameters { beta: 1.0, ..reference() };
    assert!(matches!(
        build_density(literal, FdSabrSettings::default()),
        Err(Error::InvalidDomain(_))
    ));
}

#[test]
fn test_custom_inverter_is_used() {
    let s = solve(SabrVariant::PositiveForward);
    let strikes = [0.03, 0.0488];
    let via_kind = s.volatility(&strikes, VolatilityType::Normal);
    let via_inverter = s.volatility_with(&strikes, &BachelierInverter { accuracy: 1e-14 });
    assert_eq!(via_kind, via_inverter);
}
