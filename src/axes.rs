//! Device-to-node axes alignment
//!
//! The attitude sensor reports orientation in the device frame, while the
//! camera/vehicle node expects its own axes. This module remaps vectors and
//! the vector part of quaternions between the two.
//!
//! # Example
//! ```
//! use nalgebra::Vector3;
//! use fdai_attitude::{AxesAlignment, axes_swap};
//!
//! let device = Vector3::new(1.0, 2.0, 3.0);
//! let node = axes_swap(device, AxesAlignment::NxNyPz);
//!
//! assert_eq!(node, Vector3::new(-1.0, -2.0, 3.0));
//! ```

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::math;

/// Node axes expressed in device axes.
///
/// The three letter pairs name the device axis feeding node X, Y and Z in
/// turn: `P`/`N` for the sign, `x`/`y`/`z` for the axis. `PyNxPz` means
/// node X = +device Y, node Y = -device X, node Z = +device Z.
///
/// Only the 24 proper rotations are listed, so remapping a quaternion's vector
/// part always yields another rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AxesAlignment {
    #[default]
    PxPyPz,
    PxNzPy,
    PxNyNz,
    PxPzNy,
    NxPyNz,
    NxPzPy,
    /// Device attitude as seen by the FDAI camera node: half-turn about Z.
    NxNyPz,
    NxNzNy,
    PyNxPz,
    PyNzNx,
    PyPxNz,
    PyPzPx,
    NyPxPz,
    NyNzPx,
    NyNxNz,
    NyPzNx,
    PzPyNx,
    PzPxPy,
    PzNyPx,
    PzNxNy,
    NzPyPx,
    NzNxPy,
    NzNyNx,
    NzPxNy,
}

impl AxesAlignment {
    /// Every alignment, identity first.
    pub const ALL: [AxesAlignment; 24] = [
        Self::PxPyPz,
        Self::PxNzPy,
        Self::PxNyNz,
        Self::PxPzNy,
        Self::NxPyNz,
        Self::NxPzPy,
        Self::NxNyPz,
        Self::NxNzNy,
        Self::PyNxPz,
        Self::PyNzNx,
        Self::PyPxNz,
        Self::PyPzPx,
        Self::NyPxPz,
        Self::NyNzPx,
        Self::NyNxNz,
        Self::NyPzNx,
        Self::PzPyNx,
        Self::PzPxPy,
        Self::PzNyPx,
        Self::PzNxNy,
        Self::NzPyPx,
        Self::NzNxPy,
        Self::NzNyNx,
        Self::NzPxNy,
    ];

    /// Source `(device axis index, sign)` for node X, Y and Z.
    const fn sources(self) -> [(usize, f32); 3] {
        const X: usize = 0;
        const Y: usize = 1;
        const Z: usize = 2;
        match self {
            Self::PxPyPz => [(X, 1.0), (Y, 1.0), (Z, 1.0)],
            Self::PxNzPy => [(X, 1.0), (Z, -1.0), (Y, 1.0)],
            Self::PxNyNz => [(X, 1.0), (Y, -1.0), (Z, -1.0)],
            Self::PxPzNy => [(X, 1.0), (Z, 1.0), (Y, -1.0)],
            Self::NxPyNz => [(X, -1.0), (Y, 1.0), (Z, -1.0)],
            Self::NxPzPy => [(X, -1.0), (Z, 1.0), (Y, 1.0)],
            Self::NxNyPz => [(X, -1.0), (Y, -1.0), (Z, 1.0)],
            Self::NxNzNy => [(X, -1.0), (Z, -1.0), (Y, -1.0)],
            Self::PyNxPz => [(Y, 1.0), (X, -1.0), (Z, 1.0)],
            Self::PyNzNx => [(Y, 1.0), (Z, -1.0), (X, -1.0)],
            Self::PyPxNz => [(Y, 1.0), (X, 1.0), (Z, -1.0)],
            Self::PyPzPx => [(Y, 1.0), (Z, 1.0), (X, 1.0)],
            Self::NyPxPz => [(Y, -1.0), (X, 1.0), (Z, 1.0)],
            Self::NyNzPx => [(Y, -1.0), (Z, -1.0), (X, 1.0)],
            Self::NyNxNz => [(Y, -1.0), (X, -1.0), (Z, -1.0)],
            Self::NyPzNx => [(Y, -1.0), (Z, 1.0), (X, -1.0)],
            Self::PzPyNx => [(Z, 1.0), (Y, 1.0), (X, -1.0)],
            Self::PzPxPy => [(Z, 1.0), (X, 1.0), (Y, 1.0)],
            Self::PzNyPx => [(Z, 1.0), (Y, -1.0), (X, 1.0)],
            Self::PzNxNy => [(Z, 1.0), (X, -1.0), (Y, -1.0)],
            Self::NzPyPx => [(Z, -1.0), (Y, 1.0), (X, 1.0)],
            Self::NzNxPy => [(Z, -1.0), (X, -1.0), (Y, 1.0)],
            Self::NzNyNx => [(Z, -1.0), (Y, -1.0), (X, -1.0)],
            Self::NzPxNy => [(Z, -1.0), (X, 1.0), (Y, -1.0)],
        }
    }
}

/// Remap a device-frame vector into node axes.
#[inline]
pub fn axes_swap(device: Vector3<f32>, alignment: AxesAlignment) -> Vector3<f32> {
    let [x, y, z] = alignment.sources();
    Vector3::new(device[x.0] * x.1, device[y.0] * y.1, device[z.0] * z.1)
}

/// Remap a device-frame attitude into node axes.
///
/// Only the vector part moves; the scalar part, and so the rotation angle, is
/// kept. `NxNyPz` turns `(x, y, z, w)` into `(-x, -y, z, w)`.
pub fn remap_quaternion(q: &UnitQuaternion<f32>, alignment: AxesAlignment) -> UnitQuaternion<f32> {
    if alignment == AxesAlignment::PxPyPz {
        return *q;
    }
    let vector = axes_swap(q.imag(), alignment);
    math::normalize(Quaternion::from_parts(q.scalar(), vector))
}
