use crate::{
    BranchId,
    model::{BranchFeature, Network},
};

impl Network {
    /// Features attached to `branch` immediately before and after `offset`.
    ///
    /// Features exactly at `offset` are on neither side. Either side is
    /// `None` when the branch has no feature there, or the branch is unknown.
    pub fn get_neighbours_on_branch(
        &self,
        branch: BranchId,
        offset: f64,
    ) -> (Option<&BranchFeature>, Option<&BranchFeature>) {
        let Some(branch) = self.branch(branch) else {
            return (None, None);
        };

        // features are kept sorted by offset
        let features = branch.features();
        let before = features
            .iter()
            .rev()
            .find(|feature| feature.offset() < offset);
        let after = features.iter().find(|feature| feature.offset() > offset);

        (before, after)
    }
}
