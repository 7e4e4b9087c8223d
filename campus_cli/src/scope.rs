use campus_pagination::{
    collection::Collection, managed_context::ManagedContext, page_fetcher::ListScope,
};
use clap::Args;

#[derive(Args)]
pub struct ScopeArgs {
    /// classes, owners or customers
    #[arg(short, long)]
    collection: Collection,

    /// Sent as X-Managed-School-Id
    #[arg(long)]
    school_id: Option<String>,

    /// Sent as X-Managed-Branch-Id
    #[arg(long)]
    branch_id: Option<String>,

    /// Sent as X-Managed-Course-Id
    #[arg(long)]
    course_id: Option<String>,
}

impl ScopeArgs {
    pub fn into_scope(self) -> ListScope {
        ListScope::new(self.collection).with_context(ManagedContext::new(
            self.school_id,
            self.branch_id,
            self.course_id,
        ))
    }
}
