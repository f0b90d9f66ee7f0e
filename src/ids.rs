//! Shape identifier synthesis.
//!
//! The vendor format allows `Shape` elements without an `ID` attribute; the
//! loader assigns one so the editing model can always reference shapes by id.
//! Generation lives behind a trait so tests can substitute a deterministic
//! sequence.

/// Source of fresh shape identifiers.
pub trait IdGen {
    /// Produce one candidate id. Uniqueness against existing ids is the
    /// caller's job (see [`unique_shape_id`]).
    fn next_id(&mut self) -> String;
}

/// Default generator: `shape-` followed by 8 lowercase hex characters, the
/// same wire format the editor has always emitted.
#[derive(Debug, Default)]
pub struct RandomIdGen;

impl IdGen for RandomIdGen {
    fn next_id(&mut self) -> String {
        format!("shape-{:08x}", fastrand::u32(..))
    }
}

/// Deterministic generator for tests: `shape-00000000`, `shape-00000001`, ...
#[derive(Debug, Default)]
pub struct SequentialIdGen {
    next: u32,
}

impl IdGen for SequentialIdGen {
    fn next_id(&mut self) -> String {
        let id = format!("shape-{:08x}", self.next);
        self.next += 1;
        id
    }
}

/// Draw ids until one does not collide with `taken`. With 32 random bits and
/// document-sized shape sets a retry is already vanishingly rare; the loop
/// makes collisions impossible rather than merely unlikely.
pub fn unique_shape_id<F>(ids: &mut dyn IdGen, mut taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    loop {
        let id = ids.next_id();
        if !taken(&id) {
            return id;
        }
    }
}
