//! Voltage-divider resistance model.
//!
//! Both hotplate paths are a known shunt in series with an unknown element.
//! Given the drive voltage across the pair and the voltage across the
//! unknown element, `R = V_node * R_shunt / (V_drive - V_node)`.
//!
//! The denominator can be a few ADC counts wide, so everything is evaluated
//! in `f64` and a non-positive denominator is reported instead of producing
//! an infinite or negative resistance.

use hp_core::{Real, ensure_finite};

use crate::error::{ControlError, ControlResult};

/// Heater resistance from the heater node voltage `v_heater_mv`, the
/// commanded actuator voltage `v_dac_mv` and the heater-path shunt.
pub fn heater_resistance(v_heater_mv: Real, v_dac_mv: Real, shunt_ohm: Real) -> ControlResult<Real> {
    divider(
        v_heater_mv,
        v_dac_mv,
        shunt_ohm,
        "commanded voltage must exceed heater node voltage",
    )
}

/// Sensing-layer resistance from the sensor node voltage `v_sensor_mv`, the
/// supply reference `v_ref_mv` and the sensor-path shunt.
pub fn sensor_resistance(v_sensor_mv: Real, v_ref_mv: Real, shunt_ohm: Real) -> ControlResult<Real> {
    divider(
        v_sensor_mv,
        v_ref_mv,
        shunt_ohm,
        "reference voltage must exceed sensor node voltage",
    )
}

fn divider(v_node: Real, v_drive: Real, shunt: Real, what: &'static str) -> ControlResult<Real> {
    ensure_finite(v_node, "divider node voltage")?;
    ensure_finite(v_drive, "divider drive voltage")?;
    ensure_finite(shunt, "divider shunt")?;
    if v_node < 0.0 || shunt <= 0.0 {
        return Err(ControlError::InvalidArg {
            what: "divider inputs must be non-negative with a positive shunt",
        });
    }
    let denom = v_drive - v_node;
    if denom <= 0.0 {
        return Err(ControlError::Division { what });
    }
    Ok(ensure_finite(v_node * shunt / denom, "divider resistance")?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heater_resistance_exact() {
        assert_eq!(heater_resistance(100.0, 300.0, 100.0).unwrap(), 50.0);
    }

    #[test]
    fn sensor_resistance_basic() {
        // Half the supply across the sensing layer means it equals the shunt
        assert_eq!(
            sensor_resistance(1650.0, 3300.0, 100_000.0).unwrap(),
            100_000.0
        );
    }

    #[test]
    fn zero_denominator_is_division_fault() {
        let err = sensor_resistance(3300.0, 3300.0, 1_000_000.0).unwrap_err();
        assert!(matches!(err, ControlError::Division { .. }));
    }

    #[test]
    fn negative_denominator_is_division_fault() {
        let err = heater_resistance(400.0, 300.0, 100.0).unwrap_err();
        assert!(matches!(err, ControlError::Division { .. }));
    }

    #[test]
    fn zero_node_voltage_is_zero_ohm() {
        assert_eq!(heater_resistance(0.0, 300.0, 100.0).unwrap(), 0.0);
    }

    #[test]
    fn non_finite_input_rejected() {
        assert!(heater_resistance(Real::NAN, 300.0, 100.0).is_err());
        assert!(sensor_resistance(10.0, Real::INFINITY, 100.0).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn result_is_finite_and_non_negative_or_division_fault(
            v_node in 0_u16..=3300,
            v_drive in 0_u16..=3300,
            shunt in 1.0_f64..2.0e6,
        ) {
            match heater_resistance(f64::from(v_node), f64::from(v_drive), shunt) {
                Ok(r) => {
                    prop_assert!(r.is_finite());
                    prop_assert!(r >= 0.0);
                    prop_assert!(v_drive > v_node);
                }
                Err(ControlError::Division { .. }) => prop_assert!(v_drive <= v_node),
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
        }
    }
}
