// hp-core/src/units.rs

use uom::si::f64::{
    ElectricPotential as UomElectricPotential, ElectricalResistance as UomElectricalResistance,
};

// Public canonical unit types (SI, f64)
pub type Voltage = UomElectricPotential;
pub type Resistance = UomElectricalResistance;

#[inline]
pub fn mv(v: f64) -> Voltage {
    use uom::si::electric_potential::millivolt;
    Voltage::new::<millivolt>(v)
}

#[inline]
pub fn ohm(v: f64) -> Resistance {
    use uom::si::electrical_resistance::ohm;
    Resistance::new::<ohm>(v)
}

/// Value of `v` in millivolts.
#[inline]
pub fn as_mv(v: Voltage) -> f64 {
    use uom::si::electric_potential::millivolt;
    v.get::<millivolt>()
}

/// Value of `r` in ohms.
#[inline]
pub fn as_ohm(r: Resistance) -> f64 {
    use uom::si::electrical_resistance::ohm;
    r.get::<ohm>()
}
