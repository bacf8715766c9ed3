//! Skid buffer for valid-ready channels.
//!
//! Registers both the forward and the backward path of a channel, so that `ready` towards the upstream no longer
//! depends on `ready` from the downstream in the same cycle. Sustains one transfer per cycle.

use crate::*;

/// Skid buffer's state.
#[derive(Debug, Default, Clone, PartialEq, Signal)]
pub struct SkidState<V: Signal> {
    /// Directly connected to module output.
    m_axis_data: Valid<V>,
    /// Temp register of skid buffer.
    temp_m_axis_data: Valid<V>,
    /// Datapath control.
    m_axis_ready_int: Ready,
}

/// Skid buffer's logic.
pub type SkidLogic<V> = fn(&Valid<V>, &Ready, &SkidState<V>) -> (Valid<V>, Ready, SkidState<V>);

/// Skid buffer module.
pub type SkidBuffer<V> = Fsm<VrChannel<V>, VrChannel<V>, SkidState<V>, SkidLogic<V>>;

fn logic<V: Signal>(i_fwd: &Valid<V>, o_bwd: &Ready, state: &SkidState<V>) -> (Valid<V>, Ready, SkidState<V>) {
    // Projections.
    let Valid { inner: skid_buffer_data_int, valid: skid_buffer_valid_int } = i_fwd;

    let Valid { inner: m_axis_data_reg, valid: m_axis_valid_reg } = &state.m_axis_data;
    let Valid { inner: temp_m_axis_data_reg, valid: temp_m_axis_valid_reg } = &state.temp_m_axis_data;
    let m_axis_ready_int_reg = state.m_axis_ready_int.ready;

    let m_axis_ready = o_bwd.ready;

    // Computes control path predicates.
    let m_axis_valid_int = *skid_buffer_valid_int && m_axis_ready_int_reg;
    let m_axis_ready_int_early = m_axis_ready || (!temp_m_axis_valid_reg && (!m_axis_valid_reg || !m_axis_valid_int));

    let store_axis_int_to_output = m_axis_ready_int_reg && m_axis_ready || !m_axis_valid_reg;
    let store_axis_int_to_temp = m_axis_ready_int_reg && !m_axis_ready && *m_axis_valid_reg;
    let store_axis_temp_to_output = !m_axis_ready_int_reg && m_axis_ready;

    // Computes next cycle state.
    let m_axis_data_next = if store_axis_int_to_output {
        skid_buffer_data_int
    } else if store_axis_temp_to_output {
        temp_m_axis_data_reg
    } else {
        m_axis_data_reg
    };
    let temp_m_axis_data_next = if store_axis_int_to_temp { skid_buffer_data_int } else { temp_m_axis_data_reg };

    let m_axis_valid_next = if m_axis_ready_int_reg {
        if m_axis_ready || !m_axis_valid_reg {
            m_axis_valid_int
        } else {
            *m_axis_valid_reg
        }
    } else if m_axis_ready {
        *temp_m_axis_valid_reg
    } else {
        *m_axis_valid_reg
    };
    let temp_m_axis_valid_next = if m_axis_ready_int_reg {
        if m_axis_ready || !m_axis_valid_reg {
            *temp_m_axis_valid_reg
        } else {
            m_axis_valid_int
        }
    } else {
        !m_axis_ready && *temp_m_axis_valid_reg
    };

    let state_next = SkidState {
        m_axis_data: Valid::new(m_axis_valid_next, m_axis_data_next.clone()),
        temp_m_axis_data: Valid::new(temp_m_axis_valid_next, temp_m_axis_data_next.clone()),
        m_axis_ready_int: Ready::new(m_axis_ready_int_early),
    };

    (state.m_axis_data.clone(), state.m_axis_ready_int, state_next)
}

/// Creates an empty skid buffer.
pub fn skid_buffer<V: Signal>() -> SkidBuffer<V> {
    Fsm::new("buffer_skid", SkidState::default(), logic as SkidLogic<V>)
}
