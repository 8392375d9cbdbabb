//! Decoder for the multidimensional XML cellset (`Axes` + `CellData`).

use roxmltree::{Document, Node};
use tracing::trace;

use super::{Axis, Cell, Member, Response, Tuple};
use crate::error::{MdxError, MdxResult};
use crate::types::MdxValue;

const SLICER_AXIS: &str = "SlicerAxis";
const MEASURES_HIERARCHY: &str = "[Measures]";
const NUMERIC_TYPES: [&str; 5] = ["double", "int", "long", "short", "unsignedInt"];

/// Parses `xml` and decodes its root element as a cellset.
pub fn decode_cellset_str(xml: &str) -> MdxResult<Response> {
    let document = Document::parse(xml)?;
    decode_cellset(document.root_element())
}

/// Decodes a cellset element that has already been unwrapped from its
/// transport envelope.
pub fn decode_cellset(root: Node<'_, '_>) -> MdxResult<Response> {
    let axes_node = child_element(root, "Axes");
    let cell_data_node = child_element(root, "CellData");
    let (axes_node, cell_data_node) = match (axes_node, cell_data_node) {
        (Some(axes), Some(cells)) => (axes, cells),
        _ => {
            return Err(MdxError::InvalidResponse(
                "Invalid table response. The axes and cell data nodes must be specified.".to_string(),
            ))
        }
    };

    let axes = decode_axes(axes_node)?;
    let column_count = axes.first().map_or(0, |a| a.tuples.len());
    let row_count = axes.get(1).map_or(1, |a| a.tuples.len());
    // a cellset without axes holds a single scalar cell
    let cell_count = if axes.is_empty() { 1 } else { column_count * row_count };
    let cells = decode_cell_data(cell_data_node, cell_count)?;

    trace!(
        axes = axes.len(),
        columns = column_count,
        rows = row_count,
        cells = cells.len(),
        "Decoded cellset"
    );

    Ok(Response::new(axes, cells))
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &'static str) -> Option<Node<'a, 'input>> {
    child_elements(node, name).next()
}

fn child_elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn decode_axes(axes_node: Node<'_, '_>) -> MdxResult<Vec<Axis>> {
    let axes: Vec<Axis> = child_elements(axes_node, "Axis")
        .filter(|n| matches!(n.attribute("name"), Some(name) if name != SLICER_AXIS))
        .map(decode_axis)
        .collect::<MdxResult<_>>()?;

    if axes.len() > 2 {
        return Err(MdxError::InvalidResponse(format!(
            "{} axes were returned, but only columns and rows are supported.",
            axes.len()
        )));
    }
    Ok(axes)
}

fn decode_axis(axis_node: Node<'_, '_>) -> MdxResult<Axis> {
    let mut tuples = Vec::new();
    for tuples_node in child_elements(axis_node, "Tuples") {
        for tuple_node in child_elements(tuples_node, "Tuple") {
            let members = child_elements(tuple_node, "Member")
                .map(decode_member)
                .collect::<MdxResult<Vec<_>>>()?;
            tuples.push(Tuple::new(members));
        }
    }
    Ok(Axis::new(tuples))
}

fn decode_member(member_node: Node<'_, '_>) -> MdxResult<Member> {
    let hierarchy = member_node.attribute("Hierarchy");
    let mut unique_name = None;
    let mut level_name = None;
    let mut level_number = None;
    let mut caption = None;
    let mut value = None;

    for property in member_node.children().filter(Node::is_element) {
        let raw = match property.text() {
            Some(raw) if !raw.is_empty() => raw,
            _ => continue,
        };
        match property.tag_name().name() {
            "UName" => unique_name = Some(raw),
            "Caption" => caption = Some(raw.to_string()),
            "LName" => level_name = Some(raw),
            "LNum" => level_number = raw.trim().parse::<u32>().ok(),
            "MEMBER_VALUE" => value = parse_value(property, raw),
            _ => {}
        }
    }

    let (unique_name, hierarchy) = match (unique_name, hierarchy) {
        (Some(unique_name), Some(hierarchy)) => (unique_name, hierarchy),
        _ => {
            return Err(MdxError::InvalidResponse(
                "Invalid member. The unique name and hierarchy must be specified.".to_string(),
            ))
        }
    };
    let level_number = level_number.ok_or_else(|| {
        MdxError::InvalidResponse(format!(
            "Invalid member {}. The level number must be specified.",
            unique_name
        ))
    })?;

    let is_measure = hierarchy == MEASURES_HIERARCHY;
    let level_expression = if is_measure {
        unique_name
    } else {
        match level_name {
            Some(level_name) if unique_name.starts_with(level_name) => level_name,
            _ => hierarchy,
        }
    };

    Ok(Member {
        is_measure,
        level_expression: level_expression.to_string(),
        level_number,
        caption,
        value,
    })
}

/// Expands sparse cell data into a dense array of `cell_count` cells.
fn decode_cell_data(cell_data_node: Node<'_, '_>, cell_count: usize) -> MdxResult<Vec<Cell>> {
    let mut cells = Vec::with_capacity(cell_count);
    for cell_node in child_elements(cell_data_node, "Cell") {
        if let Some(ordinal) = cell_node
            .attribute("CellOrdinal")
            .and_then(|o| o.trim().parse::<usize>().ok())
        {
            if ordinal >= cell_count {
                return Err(MdxError::InvalidResponse(format!(
                    "Cell ordinal {} is out of range. Expected fewer than {} cells.",
                    ordinal, cell_count
                )));
            }
            cells.resize(cells.len().max(ordinal), Cell::empty());
        }
        if cells.len() >= cell_count {
            return Err(MdxError::InvalidResponse(format!(
                "More cells were returned than the {} expected.",
                cell_count
            )));
        }
        cells.push(decode_cell(cell_node));
    }

    cells.resize(cell_count, Cell::empty());
    Ok(cells)
}

fn decode_cell(cell_node: Node<'_, '_>) -> Cell {
    let mut cell = Cell::empty();
    for property in cell_node.children().filter(Node::is_element) {
        let raw = property.text().unwrap_or_default();
        match property.tag_name().name() {
            "Value" => cell.value = parse_value(property, raw),
            "FmtValue" => cell.formatted_value = Some(raw.to_string()),
            _ => {}
        }
    }
    cell
}

/// Numbers for numeric `xsi:type` annotations, text otherwise. An empty
/// numeric value is no value.
fn parse_value(node: Node<'_, '_>, raw: &str) -> Option<MdxValue> {
    let numeric = node
        .attributes()
        .find(|a| a.name() == "type")
        .map(|a| a.value().rsplit(':').next().unwrap_or_default())
        .is_some_and(|t| NUMERIC_TYPES.contains(&t));

    if numeric {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(n) = raw.parse::<f64>() {
            return Some(MdxValue::Number(n));
        }
    }
    Some(MdxValue::Text(raw.to_string()))
}
