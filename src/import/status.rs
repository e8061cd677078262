/// Viewpoint status parser
///
/// The XML viewpoint export nests saved views inside folders. Reviewers
/// file each clash view under one of the numbered status folders; the
/// folder a view sits in is its status.
use roxmltree::{Document, Node};

use crate::error::{Error, Result};
use crate::state::data::Status;

/// One view filed under a recognized status folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewStatus {
    pub view_name: String,
    pub status: Status,
}

/// Parse the viewpoint tree into (view name, status) rows
///
/// Views directly under `<viewpoints>` or under unrecognized folders are
/// skipped. A view without a `name` attribute cannot be joined and is
/// skipped as well.
pub fn parse_view_statuses(xml: &str) -> Result<Vec<ViewStatus>> {
    let document = Document::parse(xml)?;
    let viewpoints = document
        .root_element()
        .children()
        .find(|n| n.has_tag_name("viewpoints"))
        .ok_or_else(|| Error::Malformed("no <viewpoints> section in XML".to_string()))?;

    let mut views = Vec::new();
    collect_views(viewpoints, &mut views);

    let statuses: Vec<ViewStatus> = views
        .into_iter()
        .filter_map(|(view, folder)| {
            let status = Status::from_folder(folder?)?;
            Some(ViewStatus {
                view_name: view?.to_string(),
                status,
            })
        })
        .collect();

    tracing::info!(views = statuses.len(), "parsed viewpoint statuses");
    Ok(statuses)
}

/// Collect (view name, enclosing folder name) for every view below `folder`
fn collect_views<'a, 'input>(
    folder: Node<'a, 'input>,
    out: &mut Vec<(Option<&'a str>, Option<&'a str>)>,
) {
    let folder_name = folder.attribute("name");
    for child in folder.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "viewfolder" => collect_views(child, out),
            "view" => out.push((child.attribute("name"), folder_name)),
            _ => {}
        }
    }
}
