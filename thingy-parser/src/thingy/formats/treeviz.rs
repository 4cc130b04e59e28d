//! Tree dump
//!
//!     One node per line, names quoted, with ASCII connectors:
//!
//!         "root"
//!         |
//!         +--"A"
//!         |  |
//!         |  +--"x"
//!         |
//!         +--"B"
//!
//!     Result sets have no name and are shown as `<query results>`.

use crate::thingy::ast::Node;

pub fn to_treeviz_str(node: &Node) -> String {
    let mut out = String::new();
    dump(node, "", &mut out);
    out
}

fn dump(node: &Node, prefix: &str, out: &mut String) {
    out.push('"');
    out.push_str(node.label());
    out.push_str("\"\n");
    let count = node.count();
    for (i, child) in node.iter().enumerate() {
        out.push_str(prefix);
        out.push_str("|\n");
        out.push_str(prefix);
        out.push_str("+--");
        let rail = if i + 1 < count { '|' } else { ' ' };
        dump(child, &format!("{prefix}{rail}  "), out);
    }
}
