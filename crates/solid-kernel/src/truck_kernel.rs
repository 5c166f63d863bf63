//! TruckKernel — real geometry kernel wrapping truck's API.

use crate::tessellation::{self, Extent};
use crate::traits::SolidKernel;
use crate::types::*;
use std::collections::HashMap;
use tracing::debug;

use truck_modeling::topology::Solid;
use truck_topology::shell::ShellCondition;

/// truck-shapeops tolerance used until a caller sets another.
pub const DEFAULT_TOLERANCE: f64 = 0.05;

/// A shape held by the kernel: one truck solid or a group of them.
#[derive(Clone)]
enum TruckShape {
    Single(Solid),
    Compound(Vec<Solid>),
}

impl TruckShape {
    fn solids(&self) -> &[Solid] {
        match self {
            TruckShape::Single(solid) => std::slice::from_ref(solid),
            TruckShape::Compound(solids) => solids,
        }
    }

    fn from_solids(mut solids: Vec<Solid>) -> Self {
        if solids.len() == 1 {
            if let Some(solid) = solids.pop() {
                return TruckShape::Single(solid);
            }
        }
        TruckShape::Compound(solids)
    }
}

/// Real geometry kernel backed by the truck B-rep library.
///
/// truck has no compound type and no splitter removal: compounds are plain
/// lists of solids, and `remove_seams` keeps the trait's no-op default.
pub struct TruckKernel {
    next_handle: u64,
    shapes: HashMap<u64, TruckShape>,
    /// Tolerance handed to truck-shapeops.
    tolerance: f64,
    /// Chord tolerance for the triangulation behind volume queries.
    mesh_tolerance: f64,
}

impl TruckKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            shapes: HashMap::new(),
            tolerance: DEFAULT_TOLERANCE,
            mesh_tolerance: 0.005,
        }
    }

    fn alloc_handle(&mut self) -> SolidHandle {
        let h = SolidHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    fn store(&mut self, shape: TruckShape) -> SolidHandle {
        let handle = self.alloc_handle();
        self.shapes.insert(handle.id(), shape);
        handle
    }

    /// Register a solid produced elsewhere (a loader, a modeling step).
    pub fn insert(&mut self, solid: Solid) -> SolidHandle {
        self.store(TruckShape::Single(solid))
    }

    fn get(&self, handle: &SolidHandle) -> Result<&TruckShape, KernelFault> {
        self.shapes
            .get(&handle.id())
            .ok_or_else(|| KernelFault::not_found(handle))
    }

    fn extent(&self, solid: &Solid) -> Option<Extent> {
        tessellation::solid_extent(solid, self.mesh_tolerance)
    }

    /// Whether two solids can share volume at all. Disjoint operands are
    /// answered without calling truck, which gives up on them.
    fn may_overlap(&self, a: &Solid, b: &Solid) -> bool {
        match (self.extent(a), self.extent(b)) {
            (Some(ea), Some(eb)) => ea.overlaps(&eb, 0.0),
            _ => false,
        }
    }

    fn or(&self, a: &Solid, b: &Solid) -> Result<Solid, KernelFault> {
        if !self.may_overlap(a, b) {
            // Disjoint: one solid with both sets of shells.
            debug!("disjoint fuse, merging shells without truck-shapeops");
            let shells = a.boundaries().iter().chain(b.boundaries()).cloned().collect();
            return Solid::try_new(shells)
                .map_err(|e| KernelFault::new(FaultKind::BooleanFailed, e.to_string()));
        }
        truck_shapeops::or(a, b, self.tolerance).ok_or_else(|| {
            debug!(tolerance = self.tolerance, "truck or() gave up");
            KernelFault::new(FaultKind::BooleanFailed, "truck or() returned None")
        })
    }

    fn fuse_solids(&self, solids: &[Solid]) -> Result<Solid, KernelFault> {
        let Some((first, rest)) = solids.split_first() else {
            return Err(KernelFault::new(FaultKind::NullShape, "nothing to fuse"));
        };
        let mut result = first.clone();
        for solid in rest {
            result = self.or(&result, solid)?;
        }
        Ok(result)
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl SolidKernel for TruckKernel {
    fn volume(&self, solid: &SolidHandle) -> Result<f64, KernelFault> {
        let shape = self.get(solid)?;
        Ok(shape
            .solids()
            .iter()
            .map(|s| tessellation::solid_volume(s, self.mesh_tolerance))
            .sum())
    }

    fn is_valid(&self, solid: &SolidHandle) -> Result<bool, KernelFault> {
        let shape = self.get(solid)?;
        let solids = shape.solids();
        Ok(!solids.is_empty()
            && solids.iter().all(|s| {
                !s.boundaries().is_empty()
                    && s
                        .boundaries()
                        .iter()
                        .all(|shell| shell.shell_condition() == ShellCondition::Closed)
            }))
    }

    fn is_null(&self, solid: &SolidHandle) -> bool {
        !self.shapes.contains_key(&solid.id())
    }

    fn shape_kind(&self, solid: &SolidHandle) -> Result<ShapeKind, KernelFault> {
        match self.get(solid)? {
            TruckShape::Single(_) => Ok(ShapeKind::Single),
            TruckShape::Compound(_) => Ok(ShapeKind::Compound),
        }
    }

    fn members(&mut self, solid: &SolidHandle) -> Result<Vec<SolidHandle>, KernelFault> {
        let solids = self.get(solid)?.solids().to_vec();
        Ok(solids
            .into_iter()
            .map(|s| self.store(TruckShape::Single(s)))
            .collect())
    }

    fn copy(&mut self, solid: &SolidHandle) -> Result<SolidHandle, KernelFault> {
        let shape = self.get(solid)?.clone();
        Ok(self.store(shape))
    }

    fn fuse(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelFault> {
        let mut solids = self.get(a)?.solids().to_vec();
        solids.extend(self.get(b)?.solids().iter().cloned());
        let result = self.fuse_solids(&solids)?;
        Ok(self.store(TruckShape::Single(result)))
    }

    fn fuse_all(&mut self, compound: &SolidHandle) -> Result<SolidHandle, KernelFault> {
        let result = self.fuse_solids(self.get(compound)?.solids())?;
        Ok(self.store(TruckShape::Single(result)))
    }

    fn intersect(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelFault> {
        let shape_a = self.get(a)?;
        let shape_b = self.get(b)?;
        let mut pieces = Vec::new();
        for sa in shape_a.solids() {
            for sb in shape_b.solids() {
                if !self.may_overlap(sa, sb) {
                    continue;
                }
                let common = truck_shapeops::and(sa, sb, self.tolerance).ok_or_else(|| {
                    KernelFault::new(FaultKind::BooleanFailed, "truck and() returned None")
                })?;
                pieces.push(common);
            }
        }
        // No overlap at all: an empty compound, volume zero.
        Ok(self.store(TruckShape::from_solids(pieces)))
    }

    fn subtract(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelFault> {
        let shape_a = self.get(a)?;
        let shape_b = self.get(b)?;
        let mut pieces = Vec::new();
        for sa in shape_a.solids() {
            let mut remaining = sa.clone();
            for sb in shape_b.solids() {
                if !self.may_overlap(&remaining, sb) {
                    continue;
                }
                // Subtraction = A ∩ ¬B. not() mutates in place.
                let mut complement = sb.clone();
                complement.not();
                remaining = truck_shapeops::and(&remaining, &complement, self.tolerance)
                    .ok_or_else(|| {
                        KernelFault::new(
                            FaultKind::BooleanFailed,
                            "truck and() returned None for subtraction",
                        )
                    })?;
            }
            if !remaining.boundaries().is_empty() {
                pieces.push(remaining);
            }
        }
        Ok(self.store(TruckShape::from_solids(pieces)))
    }

    fn make_compound(&mut self, solids: &[SolidHandle]) -> SolidHandle {
        let mut group = Vec::new();
        for h in solids {
            if let Some(shape) = self.shapes.get(&h.id()) {
                group.extend(shape.solids().iter().cloned());
            }
        }
        self.store(TruckShape::Compound(group))
    }

    fn set_tolerance(&mut self, tolerance: Option<f64>) {
        self.tolerance = tolerance.unwrap_or(DEFAULT_TOLERANCE);
    }

    fn tolerance(&self) -> Option<f64> {
        Some(self.tolerance)
    }

    fn release(&mut self, solid: &SolidHandle) {
        self.shapes.remove(&solid.id());
    }
}
