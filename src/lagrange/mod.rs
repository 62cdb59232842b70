//! The per-cycle Lagrange leapfrog: nodal advance, element advance, and the
//! constraint scans for the next cycle, with the three ghost-exchange
//! suspension points in between.

pub mod constraints;
pub mod elements;
pub mod eos;
pub mod hex;
pub mod nodal;

use crate::domain::Domain;
use crate::error::SimulationError;
use crate::exchange::{FieldId, GhostExchange, MessageKind};

/// Advance the domain by one time step (the step itself was already chosen
/// by the time increment controller).
pub fn lagrange_leap_frog(
    domain: &mut Domain,
    exchange: &mut dyn GhostExchange,
) -> Result<(), SimulationError> {
    lagrange_nodal(domain, exchange)?;
    lagrange_elements(domain, exchange)?;
    constraints::calc_time_constraints(domain);
    Ok(())
}

/// Nodal stage: forces, then acceleration -> velocity -> position, with the
/// position/velocity synchronization posted early so the transport can
/// overlap it with the force work.
fn lagrange_nodal(
    domain: &mut Domain,
    exchange: &mut dyn GhostExchange,
) -> Result<(), SimulationError> {
    const POS_VEL: [FieldId; 6] = [
        FieldId::CoordX,
        FieldId::CoordY,
        FieldId::CoordZ,
        FieldId::VelX,
        FieldId::VelY,
        FieldId::VelZ,
    ];

    exchange.post_receives(domain, MessageKind::PositionVelocitySync, POS_VEL.len(), false);

    calc_force_for_nodes(domain, exchange)?;

    nodal::calc_acceleration(domain);
    nodal::apply_acceleration_boundary_conditions(domain);

    let dt = domain.deltatime;
    nodal::calc_velocity(domain, dt);
    nodal::calc_position(domain, dt);

    exchange.send(domain, MessageKind::PositionVelocitySync, &POS_VEL, false);
    exchange.apply_copy(domain, &POS_VEL);

    Ok(())
}

/// Force assembly plus the boundary-node force summation across ranks.
fn calc_force_for_nodes(
    domain: &mut Domain,
    exchange: &mut dyn GhostExchange,
) -> Result<(), SimulationError> {
    const FORCES: [FieldId; 3] = [FieldId::ForceX, FieldId::ForceY, FieldId::ForceZ];

    exchange.post_receives(domain, MessageKind::NodalSum, FORCES.len(), false);
    nodal::calc_volume_force(domain)?;
    exchange.send(domain, MessageKind::NodalSum, &FORCES, false);
    exchange.apply_sum(domain, &FORCES);

    Ok(())
}

/// Element stage: kinematics, artificial viscosity, EOS, volume commit.
fn lagrange_elements(
    domain: &mut Domain,
    exchange: &mut dyn GhostExchange,
) -> Result<(), SimulationError> {
    elements::calc_lagrange_elements(domain)?;
    calc_q_for_elems(domain, exchange)?;
    eos::apply_material_properties(domain)?;
    eos::update_volumes(domain);
    Ok(())
}

/// Monotonic q needs every element to see its neighbors' velocity
/// gradients, including the ones owned by other ranks; ghosts are filled
/// between the gradient and limiter passes.
fn calc_q_for_elems(
    domain: &mut Domain,
    exchange: &mut dyn GhostExchange,
) -> Result<(), SimulationError> {
    const GRADIENTS: [FieldId; 3] = [FieldId::DelvXi, FieldId::DelvEta, FieldId::DelvZeta];

    exchange.post_receives(domain, MessageKind::MonotonicQGradients, GRADIENTS.len(), true);
    elements::calc_monotonic_q_gradients(domain);
    exchange.send(domain, MessageKind::MonotonicQGradients, &GRADIENTS, true);
    exchange.apply_copy(domain, &GRADIENTS);

    elements::calc_monotonic_q(domain)
}
