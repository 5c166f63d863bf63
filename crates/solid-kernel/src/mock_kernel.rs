//! MockKernel — deterministic test double implementing SolidKernel.
//!
//! Every shape is a union of disjoint axis-aligned boxes, so booleans and
//! volumes are exact. Faults can be injected per operation and queries can
//! be made to fail per handle, which covers every recovery path of the diff
//! pipeline without a real B-rep kernel.

use std::collections::HashMap;

use crate::traits::SolidKernel;
use crate::types::*;

/// Axis-aligned box given by its min and max corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    /// Cube with its min corner at `origin`.
    pub fn cube(origin: [f64; 3], side: f64) -> Self {
        Self {
            min: origin,
            max: [origin[0] + side, origin[1] + side, origin[2] + side],
        }
    }

    pub fn volume(&self) -> f64 {
        (0..3)
            .map(|i| (self.max[i] - self.min[i]).max(0.0))
            .product()
    }

    /// True when the interiors overlap. Boxes sharing only a face do not.
    fn overlaps(&self, other: &Aabb) -> bool {
        (0..3).all(|i| self.min[i] < other.max[i] && other.min[i] < self.max[i])
    }

    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        if !self.overlaps(other) {
            return None;
        }
        let mut min = [0.0; 3];
        let mut max = [0.0; 3];
        for i in 0..3 {
            min[i] = self.min[i].max(other.min[i]);
            max[i] = self.max[i].min(other.max[i]);
        }
        Some(Aabb { min, max })
    }

    /// `self` minus `other`, as at most six disjoint slabs.
    pub fn difference(&self, other: &Aabb) -> Vec<Aabb> {
        if !self.overlaps(other) {
            return vec![*self];
        }
        let mut pieces = Vec::new();
        let mut core = *self;
        for axis in 0..3 {
            if other.min[axis] > core.min[axis] {
                let mut slab = core;
                slab.max[axis] = other.min[axis];
                pieces.push(slab);
                core.min[axis] = other.min[axis];
            }
            if other.max[axis] < core.max[axis] {
                let mut slab = core;
                slab.min[axis] = other.max[axis];
                pieces.push(slab);
                core.max[axis] = other.max[axis];
            }
        }
        // `core` is now the overlap and is dropped.
        pieces
    }
}

fn intersect_sets(a: &[Aabb], b: &[Aabb]) -> Vec<Aabb> {
    let mut out = Vec::new();
    for x in a {
        for y in b {
            if let Some(i) = x.intersection(y) {
                out.push(i);
            }
        }
    }
    out
}

fn subtract_sets(a: &[Aabb], b: &[Aabb]) -> Vec<Aabb> {
    let mut out = Vec::new();
    for bx in a {
        let mut pieces = vec![*bx];
        for cut in b {
            pieces = pieces.iter().flat_map(|p| p.difference(cut)).collect();
        }
        out.extend(pieces);
    }
    out
}

fn union_sets(a: &[Aabb], b: &[Aabb]) -> Vec<Aabb> {
    let mut out = a.to_vec();
    out.extend(subtract_sets(b, a));
    out
}

/// One solid body: disjoint boxes plus the flags the kernel reports.
#[derive(Debug, Clone)]
struct MockBody {
    boxes: Vec<Aabb>,
    valid: bool,
    /// Reversed orientation: the body reports a negative volume.
    reversed: bool,
}

impl MockBody {
    fn new(boxes: Vec<Aabb>) -> Self {
        Self {
            boxes,
            valid: true,
            reversed: false,
        }
    }

    fn volume(&self) -> f64 {
        let v: f64 = self.boxes.iter().map(Aabb::volume).sum();
        if self.reversed {
            -v
        } else {
            v
        }
    }
}

#[derive(Debug, Clone)]
enum MockShape {
    Null,
    Single(MockBody),
    Compound(Vec<MockBody>),
}

impl MockShape {
    /// The point set covered by the shape, as disjoint boxes.
    fn flatten(&self) -> Vec<Aabb> {
        match self {
            MockShape::Null => Vec::new(),
            MockShape::Single(body) => body.boxes.clone(),
            MockShape::Compound(bodies) => bodies
                .iter()
                .fold(Vec::new(), |acc, body| union_sets(&acc, &body.boxes)),
        }
    }

    fn is_valid(&self) -> bool {
        match self {
            MockShape::Null => false,
            MockShape::Single(body) => body.valid,
            MockShape::Compound(bodies) => !bodies.is_empty() && bodies.iter().all(|b| b.valid),
        }
    }
}

/// An injected failure for one kind of operation.
#[derive(Debug, Clone)]
struct FaultRule {
    op: KernelOp,
    kind: FaultKind,
    /// `None` fails every call.
    remaining: Option<usize>,
}

/// Deterministic test double for the geometry kernel.
pub struct MockKernel {
    next_handle: u64,
    shapes: HashMap<u64, MockShape>,
    fault_rules: Vec<FaultRule>,
    /// Handles whose queries (volume, validity, kind) fail.
    poisoned: HashMap<u64, FaultKind>,
    calls: Vec<KernelOp>,
    tolerance: Option<f64>,
    /// Tolerance in effect at the latest boolean call.
    boolean_tolerance: Option<f64>,
    seam_cleanup: bool,
    /// Cleanup hands back a null shape instead of a copy.
    seam_cleanup_collapses: bool,
}

impl MockKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            shapes: HashMap::new(),
            fault_rules: Vec::new(),
            poisoned: HashMap::new(),
            calls: Vec::new(),
            tolerance: None,
            boolean_tolerance: None,
            seam_cleanup: true,
            seam_cleanup_collapses: false,
        }
    }

    /// A kernel without seam cleanup, like backends that lack it.
    pub fn without_seam_cleanup(mut self) -> Self {
        self.seam_cleanup = false;
        self
    }

    /// A kernel whose seam cleanup destroys the shape, as a backend does
    /// when it removes a sliver's only faces.
    pub fn with_collapsing_seam_cleanup(mut self) -> Self {
        self.seam_cleanup_collapses = true;
        self
    }

    fn store(&mut self, shape: MockShape) -> SolidHandle {
        let h = SolidHandle(self.next_handle);
        self.next_handle += 1;
        self.shapes.insert(h.id(), shape);
        h
    }

    fn get(&self, handle: &SolidHandle) -> Result<&MockShape, KernelFault> {
        self.shapes
            .get(&handle.id())
            .ok_or_else(|| KernelFault::not_found(handle))
    }

    /// Like `get`, but a null shape is a fault. Used by constructive calls.
    fn get_non_null(&self, handle: &SolidHandle) -> Result<&MockShape, KernelFault> {
        match self.get(handle)? {
            MockShape::Null => Err(KernelFault::null_shape(handle)),
            shape => Ok(shape),
        }
    }

    fn check_poisoned(&self, handle: &SolidHandle) -> Result<(), KernelFault> {
        match self.poisoned.get(&handle.id()) {
            Some(kind) => Err(KernelFault::new(
                *kind,
                format!("query on poisoned shape {handle}"),
            )),
            None => Ok(()),
        }
    }

    /// Record the call and fire the first matching injected fault, if any.
    fn enter(&mut self, op: KernelOp) -> Result<(), KernelFault> {
        self.calls.push(op);
        if op.is_boolean() {
            self.boolean_tolerance = self.tolerance;
        }
        let Some(pos) = self.fault_rules.iter().position(|r| r.op == op) else {
            return Ok(());
        };
        let rule = &mut self.fault_rules[pos];
        let kind = rule.kind;
        let exhausted = match rule.remaining.as_mut() {
            Some(n) => {
                *n -= 1;
                *n == 0
            }
            None => false,
        };
        if exhausted {
            self.fault_rules.remove(pos);
        }
        Err(KernelFault::new(kind, format!("injected fault on {op:?}")))
    }

    // ── Shape construction ──────────────────────────────────────────────

    /// A box solid spanning `min`..`max`.
    pub fn make_box(&mut self, min: [f64; 3], max: [f64; 3]) -> SolidHandle {
        self.store(MockShape::Single(MockBody::new(vec![Aabb::new(min, max)])))
    }

    /// A cube with its min corner at `origin`.
    pub fn make_cube(&mut self, origin: [f64; 3], side: f64) -> SolidHandle {
        self.store(MockShape::Single(MockBody::new(vec![Aabb::cube(origin, side)])))
    }

    /// A single solid covering the union of `boxes`.
    pub fn make_solid(&mut self, boxes: &[Aabb]) -> SolidHandle {
        let merged = boxes
            .iter()
            .fold(Vec::new(), |acc, b| union_sets(&acc, std::slice::from_ref(b)));
        self.store(MockShape::Single(MockBody::new(merged)))
    }

    /// A box the kernel reports as invalid.
    pub fn make_invalid_box(&mut self, min: [f64; 3], max: [f64; 3]) -> SolidHandle {
        let mut body = MockBody::new(vec![Aabb::new(min, max)]);
        body.valid = false;
        self.store(MockShape::Single(body))
    }

    /// A box with reversed orientation: its volume comes back negative.
    pub fn make_reversed_box(&mut self, min: [f64; 3], max: [f64; 3]) -> SolidHandle {
        let mut body = MockBody::new(vec![Aabb::new(min, max)]);
        body.reversed = true;
        self.store(MockShape::Single(body))
    }

    pub fn make_null(&mut self) -> SolidHandle {
        self.store(MockShape::Null)
    }

    // ── Fault injection ─────────────────────────────────────────────────

    /// Every subsequent `op` call fails with `kind`.
    pub fn fail_on(&mut self, op: KernelOp, kind: FaultKind) {
        self.fault_rules.push(FaultRule {
            op,
            kind,
            remaining: None,
        });
    }

    /// The next `times` calls of `op` fail with `kind`.
    pub fn fail_times(&mut self, op: KernelOp, kind: FaultKind, times: usize) {
        if times == 0 {
            return;
        }
        self.fault_rules.push(FaultRule {
            op,
            kind,
            remaining: Some(times),
        });
    }

    /// Volume, validity and kind queries on `handle` fail with `kind`.
    pub fn poison(&mut self, handle: &SolidHandle, kind: FaultKind) {
        self.poisoned.insert(handle.id(), kind);
    }

    // ── Inspection ──────────────────────────────────────────────────────

    /// Every constructive call made so far, in order.
    pub fn calls(&self) -> &[KernelOp] {
        &self.calls
    }

    pub fn call_count(&self, op: KernelOp) -> usize {
        self.calls.iter().filter(|c| **c == op).count()
    }

    pub fn boolean_call_count(&self) -> usize {
        self.calls.iter().filter(|c| c.is_boolean()).count()
    }

    /// Number of shapes currently held by the kernel.
    pub fn live_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn contains(&self, handle: &SolidHandle) -> bool {
        self.shapes.contains_key(&handle.id())
    }

    /// The tolerance the latest boolean call ran under.
    pub fn boolean_tolerance(&self) -> Option<f64> {
        self.boolean_tolerance
    }
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl SolidKernel for MockKernel {
    fn volume(&self, solid: &SolidHandle) -> Result<f64, KernelFault> {
        self.check_poisoned(solid)?;
        match self.get(solid)? {
            MockShape::Null => Err(KernelFault::null_shape(solid)),
            MockShape::Single(body) => Ok(body.volume()),
            MockShape::Compound(bodies) => Ok(bodies.iter().map(MockBody::volume).sum()),
        }
    }

    fn is_valid(&self, solid: &SolidHandle) -> Result<bool, KernelFault> {
        self.check_poisoned(solid)?;
        Ok(self.get(solid)?.is_valid())
    }

    fn is_null(&self, solid: &SolidHandle) -> bool {
        !matches!(
            self.shapes.get(&solid.id()),
            Some(MockShape::Single(_)) | Some(MockShape::Compound(_))
        )
    }

    fn shape_kind(&self, solid: &SolidHandle) -> Result<ShapeKind, KernelFault> {
        self.check_poisoned(solid)?;
        match self.get_non_null(solid)? {
            MockShape::Compound(_) => Ok(ShapeKind::Compound),
            _ => Ok(ShapeKind::Single),
        }
    }

    fn members(&mut self, solid: &SolidHandle) -> Result<Vec<SolidHandle>, KernelFault> {
        self.enter(KernelOp::Members)?;
        let bodies = match self.get_non_null(solid)? {
            MockShape::Single(body) => vec![body.clone()],
            MockShape::Compound(bodies) => bodies.clone(),
            MockShape::Null => Vec::new(),
        };
        Ok(bodies
            .into_iter()
            .map(|b| self.store(MockShape::Single(b)))
            .collect())
    }

    fn copy(&mut self, solid: &SolidHandle) -> Result<SolidHandle, KernelFault> {
        self.enter(KernelOp::Copy)?;
        let shape = self.get(solid)?.clone();
        Ok(self.store(shape))
    }

    fn fuse(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelFault> {
        self.enter(KernelOp::Fuse)?;
        let shape_a = self.get_non_null(a)?;
        let shape_b = self.get_non_null(b)?;
        let mut body = MockBody::new(union_sets(&shape_a.flatten(), &shape_b.flatten()));
        body.valid = shape_a.is_valid() && shape_b.is_valid();
        Ok(self.store(MockShape::Single(body)))
    }

    fn fuse_all(&mut self, compound: &SolidHandle) -> Result<SolidHandle, KernelFault> {
        self.enter(KernelOp::FuseAll)?;
        let shape = self.get_non_null(compound)?;
        let mut body = MockBody::new(shape.flatten());
        body.valid = shape.is_valid();
        Ok(self.store(MockShape::Single(body)))
    }

    fn intersect(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelFault> {
        self.enter(KernelOp::Intersect)?;
        let boxes = intersect_sets(
            &self.get_non_null(a)?.flatten(),
            &self.get_non_null(b)?.flatten(),
        );
        Ok(self.store(MockShape::Single(MockBody::new(boxes))))
    }

    fn subtract(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelFault> {
        self.enter(KernelOp::Subtract)?;
        let boxes = subtract_sets(
            &self.get_non_null(a)?.flatten(),
            &self.get_non_null(b)?.flatten(),
        );
        Ok(self.store(MockShape::Single(MockBody::new(boxes))))
    }

    fn make_compound(&mut self, solids: &[SolidHandle]) -> SolidHandle {
        let mut bodies = Vec::new();
        for h in solids {
            match self.shapes.get(&h.id()) {
                Some(MockShape::Single(body)) => bodies.push(body.clone()),
                Some(MockShape::Compound(inner)) => bodies.extend(inner.iter().cloned()),
                Some(MockShape::Null) | None => {}
            }
        }
        self.store(MockShape::Compound(bodies))
    }

    fn remove_seams(&mut self, solid: &SolidHandle) -> Result<Option<SolidHandle>, KernelFault> {
        if !self.seam_cleanup {
            return Ok(None);
        }
        self.enter(KernelOp::RemoveSeams)?;
        // Boxes carry no seams; cleanup is geometrically a copy.
        let shape = self.get_non_null(solid)?.clone();
        if self.seam_cleanup_collapses {
            return Ok(Some(self.store(MockShape::Null)));
        }
        Ok(Some(self.store(shape)))
    }

    fn set_tolerance(&mut self, tolerance: Option<f64>) {
        self.tolerance = tolerance;
    }

    fn tolerance(&self) -> Option<f64> {
        self.tolerance
    }

    fn release(&mut self, solid: &SolidHandle) {
        self.shapes.remove(&solid.id());
        self.poisoned.remove(&solid.id());
    }
}
