//! Nash equilibria of two-player extensive-form games, computed by
//! reformulating the game in sequence form as a linear complementarity
//! problem and solving it with Lemke's complementary pivoting, optionally
//! enumerating every equilibrium reachable by alternate pivot paths.
//!
//! The pipeline: a [`game::Game`] plus a [`game::Support`] goes through
//! [`sequence_form`] into an LCP system, [`tableau`] pivots it, [`lemke`]
//! drives the path following and enumeration, and [`profile`] turns
//! terminal bases back into behavior profiles. Everything is generic over
//! [`numeric::Field`], so the same code runs in f64 and in exact rational
//! arithmetic.

pub mod batch;
pub mod catalog;
pub mod cli;
pub mod display;
pub mod error;
pub mod game;
pub mod lemke;
pub mod numeric;
pub mod profile;
pub mod sequence_form;
pub mod tableau;
