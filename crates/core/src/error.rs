use crate::morphology::SectionId;

pub type ReconstructionResult<T> = Result<T, ReconstructionError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconstructionError {
    #[error("section {0} is referenced but not part of the morphology")]
    UnknownSection(SectionId),

    #[error("section {section} is outside the compartment table ({len} entries)")]
    SectionOutOfTable { section: SectionId, len: usize },

    #[error("user data policy requires a compartment table but none was provided")]
    MissingCompartmentTable,

    #[error("compartment table has {offsets} offsets but {counts} counts")]
    InconsistentTable { offsets: usize, counts: usize },

    #[error("tree structure covers {tree} sections but the morphology has {sections}")]
    TreeMismatch { tree: usize, sections: usize },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}
