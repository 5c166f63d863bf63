use crate::types::*;

/// Capability set the diff core requires from a geometry kernel.
///
/// Shapes are referenced through [`SolidHandle`]s and are never mutated in
/// place: every constructive call returns a new, independently owned handle.
/// Implemented by `TruckKernel` (wraps truck) and `MockKernel`
/// (deterministic test double).
pub trait SolidKernel {
    /// Volume of a shape. May be signed depending on the backend; callers
    /// compare by magnitude.
    fn volume(&self, solid: &SolidHandle) -> Result<f64, KernelFault>;

    /// Whether the shape is a well-formed closed solid (or compound of them).
    fn is_valid(&self, solid: &SolidHandle) -> Result<bool, KernelFault>;

    /// Whether the handle refers to a null shape. Unknown handles are null.
    fn is_null(&self, solid: &SolidHandle) -> bool;

    fn shape_kind(&self, solid: &SolidHandle) -> Result<ShapeKind, KernelFault>;

    /// Independent copies of the constituents of a compound, in order.
    /// A single solid yields one copy of itself.
    fn members(&mut self, solid: &SolidHandle) -> Result<Vec<SolidHandle>, KernelFault>;

    /// Independent copy of a shape.
    fn copy(&mut self, solid: &SolidHandle) -> Result<SolidHandle, KernelFault>;

    /// Boolean union of two shapes.
    fn fuse(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelFault>;

    /// Fuse every constituent of a compound in a single kernel call.
    fn fuse_all(&mut self, compound: &SolidHandle) -> Result<SolidHandle, KernelFault>;

    /// Boolean intersection of two shapes.
    fn intersect(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelFault>;

    /// Boolean subtraction: a minus b.
    fn subtract(&mut self, a: &SolidHandle, b: &SolidHandle) -> Result<SolidHandle, KernelFault>;

    /// Group shapes into a compound without merging them. Never fails;
    /// handles that do not resolve are left out.
    fn make_compound(&mut self, solids: &[SolidHandle]) -> SolidHandle;

    /// Cosmetic cleanup of seam/splitter faces left behind by booleans.
    ///
    /// Returns `Ok(None)` when the backend has no such operation. The default
    /// implementation is that no-op.
    fn remove_seams(&mut self, _solid: &SolidHandle) -> Result<Option<SolidHandle>, KernelFault> {
        Ok(None)
    }

    /// Geometric tolerance for subsequent boolean calls. `None` restores the
    /// backend's own default. Default: ignored.
    fn set_tolerance(&mut self, _tolerance: Option<f64>) {}

    /// The tolerance currently in effect, `None` when the backend has no
    /// adjustable tolerance or it was never set.
    fn tolerance(&self) -> Option<f64> {
        None
    }

    /// Give a shape back to the kernel. The handle must not be used again.
    fn release(&mut self, _solid: &SolidHandle) {}
}

/// One named entry of a version container.
#[derive(Debug, Clone)]
pub struct ContainerEntry {
    pub name: String,
    /// The entry's geometry: `Ok(None)` when it holds none, `Err` when it
    /// could not be read.
    pub solid: Result<Option<SolidHandle>, KernelFault>,
}

/// One version of a model: an ordered collection of named entries.
/// Read-only to the diff core.
pub trait VersionContainer {
    fn label(&self) -> &str;

    fn entries(&self) -> Vec<ContainerEntry>;
}
