//! Closed-form geometry kernels for the single-point-quadrature hex.
//!
//! Everything in here works on the eight corner coordinate triples of one
//! element, gathered by the caller. The volume uses the twelve-pointer mixed
//! determinant (twelve edge-difference vectors), which is exact for any
//! trilinear hex and positive for properly oriented elements.

use crate::Real;

#[inline]
fn triple_product(
    x1: Real,
    x2: Real,
    x3: Real,
    y1: Real,
    y2: Real,
    y3: Real,
    z1: Real,
    z2: Real,
    z3: Real,
) -> Real {
    x1 * (y2 * z3 - z2 * y3) + x2 * (z1 * y3 - y1 * z3) + x3 * (y1 * z2 - z1 * y2)
}

/// Signed volume of a distorted hex from its corner coordinates.
///
/// Returns +1 for the canonical unit cube; swapping the top and bottom faces
/// flips the sign. A nonpositive result during a run means the mesh has
/// tangled.
pub fn calc_elem_volume(x: &[Real; 8], y: &[Real; 8], z: &[Real; 8]) -> Real {
    let dx61 = x[6] - x[1];
    let dy61 = y[6] - y[1];
    let dz61 = z[6] - z[1];

    let dx70 = x[7] - x[0];
    let dy70 = y[7] - y[0];
    let dz70 = z[7] - z[0];

    let dx63 = x[6] - x[3];
    let dy63 = y[6] - y[3];
    let dz63 = z[6] - z[3];

    let dx20 = x[2] - x[0];
    let dy20 = y[2] - y[0];
    let dz20 = z[2] - z[0];

    let dx50 = x[5] - x[0];
    let dy50 = y[5] - y[0];
    let dz50 = z[5] - z[0];

    let dx64 = x[6] - x[4];
    let dy64 = y[6] - y[4];
    let dz64 = z[6] - z[4];

    let dx31 = x[3] - x[1];
    let dy31 = y[3] - y[1];
    let dz31 = z[3] - z[1];

    let dx72 = x[7] - x[2];
    let dy72 = y[7] - y[2];
    let dz72 = z[7] - z[2];

    let dx43 = x[4] - x[3];
    let dy43 = y[4] - y[3];
    let dz43 = z[4] - z[3];

    let dx57 = x[5] - x[7];
    let dy57 = y[5] - y[7];
    let dz57 = z[5] - z[7];

    let dx14 = x[1] - x[4];
    let dy14 = y[1] - y[4];
    let dz14 = z[1] - z[4];

    let dx25 = x[2] - x[5];
    let dy25 = y[2] - y[5];
    let dz25 = z[2] - z[5];

    let volume = triple_product(
        dx31 + dx72,
        dx63,
        dx20,
        dy31 + dy72,
        dy63,
        dy20,
        dz31 + dz72,
        dz63,
        dz20,
    ) + triple_product(
        dx43 + dx57,
        dx64,
        dx70,
        dy43 + dy57,
        dy64,
        dy70,
        dz43 + dz57,
        dz64,
        dz70,
    ) + triple_product(
        dx14 + dx25,
        dx61,
        dx50,
        dy14 + dy25,
        dy61,
        dy50,
        dz14 + dz25,
        dz61,
        dz50,
    );

    volume / 12.0
}

#[inline]
fn area_face(
    x0: Real,
    x1: Real,
    x2: Real,
    x3: Real,
    y0: Real,
    y1: Real,
    y2: Real,
    y3: Real,
    z0: Real,
    z1: Real,
    z2: Real,
    z3: Real,
) -> Real {
    let fx = (x2 - x0) - (x3 - x1);
    let fy = (y2 - y0) - (y3 - y1);
    let fz = (z2 - z0) - (z3 - z1);
    let gx = (x2 - x0) + (x3 - x1);
    let gy = (y2 - y0) + (y3 - y1);
    let gz = (z2 - z0) + (z3 - z1);
    (fx * fx + fy * fy + fz * fz) * (gx * gx + gy * gy + gz * gz)
        - (fx * gx + fy * gy + fz * gz) * (fx * gx + fy * gy + fz * gz)
}

/// Characteristic length of an element: volume over its largest face,
/// the length scale the Courant condition measures wave transit against.
pub fn calc_elem_characteristic_length(
    x: &[Real; 8],
    y: &[Real; 8],
    z: &[Real; 8],
    volume: Real,
) -> Real {
    let mut char_length: Real = 0.0;

    let faces: [[usize; 4]; 6] = [
        [0, 1, 2, 3],
        [4, 5, 6, 7],
        [0, 1, 5, 4],
        [1, 2, 6, 5],
        [2, 3, 7, 6],
        [3, 0, 4, 7],
    ];
    for f in &faces {
        let a = area_face(
            x[f[0]], x[f[1]], x[f[2]], x[f[3]],
            y[f[0]], y[f[1]], y[f[2]], y[f[3]],
            z[f[0]], z[f[1]], z[f[2]], z[f[3]],
        );
        char_length = char_length.max(a);
    }

    4.0 * volume / char_length.sqrt()
}

/// Shape-function derivatives (the B matrix) and Jacobian determinant at the
/// element center.
///
/// Cofactors of the center Jacobian give the corner partials directly; only
/// corners 0-3 are independent, corners 4-7 are their negatives by symmetry.
/// The returned determinant carries the factor of eight, so it equals the
/// element volume for affine geometries.
pub fn calc_elem_shape_function_derivatives(
    x: &[Real; 8],
    y: &[Real; 8],
    z: &[Real; 8],
) -> ([[Real; 8]; 3], Real) {
    let fjxxi = 0.125 * ((x[6] - x[0]) + (x[5] - x[3]) - (x[7] - x[1]) - (x[4] - x[2]));
    let fjxet = 0.125 * ((x[6] - x[0]) - (x[5] - x[3]) + (x[7] - x[1]) - (x[4] - x[2]));
    let fjxze = 0.125 * ((x[6] - x[0]) + (x[5] - x[3]) + (x[7] - x[1]) + (x[4] - x[2]));

    let fjyxi = 0.125 * ((y[6] - y[0]) + (y[5] - y[3]) - (y[7] - y[1]) - (y[4] - y[2]));
    let fjyet = 0.125 * ((y[6] - y[0]) - (y[5] - y[3]) + (y[7] - y[1]) - (y[4] - y[2]));
    let fjyze = 0.125 * ((y[6] - y[0]) + (y[5] - y[3]) + (y[7] - y[1]) + (y[4] - y[2]));

    let fjzxi = 0.125 * ((z[6] - z[0]) + (z[5] - z[3]) - (z[7] - z[1]) - (z[4] - z[2]));
    let fjzet = 0.125 * ((z[6] - z[0]) - (z[5] - z[3]) + (z[7] - z[1]) - (z[4] - z[2]));
    let fjzze = 0.125 * ((z[6] - z[0]) + (z[5] - z[3]) + (z[7] - z[1]) + (z[4] - z[2]));

    // cofactors
    let cjxxi = fjyet * fjzze - fjzet * fjyze;
    let cjxet = -fjyxi * fjzze + fjzxi * fjyze;
    let cjxze = fjyxi * fjzet - fjzxi * fjyet;

    let cjyxi = -fjxet * fjzze + fjzet * fjxze;
    let cjyet = fjxxi * fjzze - fjzxi * fjxze;
    let cjyze = -fjxxi * fjzet + fjzxi * fjxet;

    let cjzxi = fjxet * fjyze - fjyet * fjxze;
    let cjzet = -fjxxi * fjyze + fjyxi * fjxze;
    let cjzze = fjxxi * fjyet - fjyxi * fjxet;

    let mut b = [[0.0; 8]; 3];

    b[0][0] = -cjxxi - cjxet - cjxze;
    b[0][1] = cjxxi - cjxet - cjxze;
    b[0][2] = cjxxi + cjxet - cjxze;
    b[0][3] = -cjxxi + cjxet - cjxze;
    b[0][4] = -b[0][2];
    b[0][5] = -b[0][3];
    b[0][6] = -b[0][0];
    b[0][7] = -b[0][1];

    b[1][0] = -cjyxi - cjyet - cjyze;
    b[1][1] = cjyxi - cjyet - cjyze;
    b[1][2] = cjyxi + cjyet - cjyze;
    b[1][3] = -cjyxi + cjyet - cjyze;
    b[1][4] = -b[1][2];
    b[1][5] = -b[1][3];
    b[1][6] = -b[1][0];
    b[1][7] = -b[1][1];

    b[2][0] = -cjzxi - cjzet - cjzze;
    b[2][1] = cjzxi - cjzet - cjzze;
    b[2][2] = cjzxi + cjzet - cjzze;
    b[2][3] = -cjzxi + cjzet - cjzze;
    b[2][4] = -b[2][2];
    b[2][5] = -b[2][3];
    b[2][6] = -b[2][0];
    b[2][7] = -b[2][1];

    let det = 8.0 * (fjxet * cjxet + fjyet * cjyet + fjzet * cjzet);
    (b, det)
}

#[inline]
#[allow(clippy::too_many_arguments)]
fn sum_elem_face_normal(
    normals: &mut [[Real; 3]; 8],
    n0: usize,
    n1: usize,
    n2: usize,
    n3: usize,
    x: &[Real; 8],
    y: &[Real; 8],
    z: &[Real; 8],
) {
    let bisect_x0 = 0.5 * (x[n3] + x[n2] - x[n1] - x[n0]);
    let bisect_y0 = 0.5 * (y[n3] + y[n2] - y[n1] - y[n0]);
    let bisect_z0 = 0.5 * (z[n3] + z[n2] - z[n1] - z[n0]);
    let bisect_x1 = 0.5 * (x[n2] + x[n1] - x[n3] - x[n0]);
    let bisect_y1 = 0.5 * (y[n2] + y[n1] - y[n3] - y[n0]);
    let bisect_z1 = 0.5 * (z[n2] + z[n1] - z[n3] - z[n0]);

    let area_x = 0.25 * (bisect_y0 * bisect_z1 - bisect_z0 * bisect_y1);
    let area_y = 0.25 * (bisect_z0 * bisect_x1 - bisect_x0 * bisect_z1);
    let area_z = 0.25 * (bisect_x0 * bisect_y1 - bisect_y0 * bisect_x1);

    for &n in &[n0, n1, n2, n3] {
        normals[n][0] += area_x;
        normals[n][1] += area_y;
        normals[n][2] += area_z;
    }
}

/// Quarter-area face normals accumulated per corner; the integration weights
/// the stress divergence uses.
pub fn calc_elem_node_normals(x: &[Real; 8], y: &[Real; 8], z: &[Real; 8]) -> [[Real; 3]; 8] {
    let mut normals = [[0.0; 3]; 8];
    sum_elem_face_normal(&mut normals, 0, 1, 2, 3, x, y, z);
    sum_elem_face_normal(&mut normals, 0, 4, 5, 1, x, y, z);
    sum_elem_face_normal(&mut normals, 1, 5, 6, 2, x, y, z);
    sum_elem_face_normal(&mut normals, 2, 6, 7, 3, x, y, z);
    sum_elem_face_normal(&mut normals, 3, 7, 4, 0, x, y, z);
    sum_elem_face_normal(&mut normals, 4, 7, 6, 5, x, y, z);
    normals
}

/// Corner forces from an isotropic element stress: f = -sigma . n per corner.
pub fn sum_elem_stresses_to_node_forces(
    normals: &[[Real; 3]; 8],
    sig_xx: Real,
    sig_yy: Real,
    sig_zz: Real,
) -> [[Real; 3]; 8] {
    let mut f = [[0.0; 3]; 8];
    for i in 0..8 {
        f[i][0] = -sig_xx * normals[i][0];
        f[i][1] = -sig_yy * normals[i][1];
        f[i][2] = -sig_zz * normals[i][2];
    }
    f
}

#[inline]
#[allow(clippy::too_many_arguments)]
fn volu_der(
    x0: Real,
    x1: Real,
    x2: Real,
    x3: Real,
    x4: Real,
    x5: Real,
    y0: Real,
    y1: Real,
    y2: Real,
    y3: Real,
    y4: Real,
    y5: Real,
    z0: Real,
    z1: Real,
    z2: Real,
    z3: Real,
    z4: Real,
    z5: Real,
) -> [Real; 3] {
    let twelfth = 1.0 / 12.0;

    let dvdx = (y1 + y2) * (z0 + z1) - (y0 + y1) * (z1 + z2) + (y0 + y4) * (z3 + z4)
        - (y3 + y4) * (z0 + z4)
        - (y2 + y5) * (z3 + z5)
        + (y3 + y5) * (z2 + z5);

    let dvdy = -(x1 + x2) * (z0 + z1) + (x0 + x1) * (z1 + z2) - (x0 + x4) * (z3 + z4)
        + (x3 + x4) * (z0 + z4)
        + (x2 + x5) * (z3 + z5)
        - (x3 + x5) * (z2 + z5);

    let dvdz = -(y1 + y2) * (x0 + x1) + (y0 + y1) * (x1 + x2) - (y0 + y4) * (x3 + x4)
        + (y3 + y4) * (x0 + x4)
        + (y2 + y5) * (x3 + x5)
        - (y3 + y5) * (x2 + x5);

    [dvdx * twelfth, dvdy * twelfth, dvdz * twelfth]
}

/// Gradient of the element volume with respect to each corner position.
/// Feeds the hourglass mode projection.
pub fn calc_elem_volume_derivative(
    x: &[Real; 8],
    y: &[Real; 8],
    z: &[Real; 8],
) -> [[Real; 3]; 8] {
    // each corner sees the six corners bounding its three incident faces
    const STENCIL: [[usize; 6]; 8] = [
        [1, 2, 3, 4, 5, 7],
        [2, 3, 0, 5, 6, 4],
        [3, 0, 1, 6, 7, 5],
        [0, 1, 2, 7, 4, 6],
        [7, 6, 5, 0, 3, 1],
        [6, 7, 4, 1, 2, 0],
        [5, 4, 7, 2, 1, 3],
        [4, 5, 6, 3, 0, 2],
    ];

    let mut dvd = [[0.0; 3]; 8];
    for (corner, s) in STENCIL.iter().enumerate() {
        dvd[corner] = volu_der(
            x[s[0]], x[s[1]], x[s[2]], x[s[3]], x[s[4]], x[s[5]],
            y[s[0]], y[s[1]], y[s[2]], y[s[3]], y[s[4]], y[s[5]],
            z[s[0]], z[s[1]], z[s[2]], z[s[3]], z[s[4]], z[s[5]],
        );
    }
    dvd
}

/// Diagonal of the velocity gradient at the element center from the corner
/// velocities and the shape-function derivatives evaluated there.
pub fn calc_elem_velocity_gradient(
    xvel: &[Real; 8],
    yvel: &[Real; 8],
    zvel: &[Real; 8],
    b: &[[Real; 8]; 3],
    detj: Real,
) -> [Real; 3] {
    let inv_detj = 1.0 / detj;
    let pfx = &b[0];
    let pfy = &b[1];
    let pfz = &b[2];

    let dxx = inv_detj
        * (pfx[0] * (xvel[0] - xvel[6])
            + pfx[1] * (xvel[1] - xvel[7])
            + pfx[2] * (xvel[2] - xvel[4])
            + pfx[3] * (xvel[3] - xvel[5]));
    let dyy = inv_detj
        * (pfy[0] * (yvel[0] - yvel[6])
            + pfy[1] * (yvel[1] - yvel[7])
            + pfy[2] * (yvel[2] - yvel[4])
            + pfy[3] * (yvel[3] - yvel[5]));
    let dzz = inv_detj
        * (pfz[0] * (zvel[0] - zvel[6])
            + pfz[1] * (zvel[1] - zvel[7])
            + pfz[2] * (zvel[2] - zvel[4])
            + pfz[3] * (zvel[3] - zvel[5]));

    [dxx, dyy, dzz]
}
