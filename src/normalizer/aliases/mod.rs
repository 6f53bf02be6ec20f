mod resolver;
mod table;

pub use resolver::{AliasResolver, AppliedAlias, Resolution};
pub use table::{AliasCategory, AliasEntry, AliasTable, RuleSet};


pub fn resolve_aliases(text: &str) -> String {
    AliasResolver::new(AliasTable::standard()).resolve(text)
}
