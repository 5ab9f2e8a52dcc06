use kernel::id::{Id, markers};

pub type TokenId = Id<markers::VerificationToken>;
