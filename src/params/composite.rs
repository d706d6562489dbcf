// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Composite parameter shapes that arrive either as encoded strings or as JSON structures.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::FromParam;
use crate::model::values::column_index;
use crate::model::{CellRange, Color, Point, TabAlignment, TabStop};

/// Coordinates given as `"x1,y1,x2,y2"`, `[x1, y1, ...]`, `[[x, y], ...]` or
/// `[{"x": .., "y": ..}, ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PointList(pub Vec<Point>);

impl FromParam for PointList {
    const EXPECTED: &'static str = "a list of x,y coordinate pairs";

    fn from_param(value: &Value) -> Option<Self> {
        let flat = match value {
            Value::String(raw) => raw
                .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                .filter(|part| !part.is_empty())
                .map(|part| part.parse::<f64>().ok().filter(|n| n.is_finite()))
                .collect::<Option<Vec<_>>>()?,
            Value::Array(items) if items.iter().all(Value::is_number) => {
                items.iter().map(f64::from_param).collect::<Option<Vec<_>>>()?
            }
            Value::Array(items) => {
                let points = items.iter().map(point_from_value).collect::<Option<Vec<_>>>()?;
                return (!points.is_empty()).then_some(Self(points));
            }
            _ => return None,
        };
        if flat.is_empty() || flat.len() % 2 != 0 {
            return None;
        }
        Some(Self(flat.chunks_exact(2).map(|pair| Point::new(pair[0], pair[1])).collect()))
    }
}

fn point_from_value(value: &Value) -> Option<Point> {
    match value {
        Value::Array(pair) if pair.len() == 2 => {
            Some(Point::new(f64::from_param(&pair[0])?, f64::from_param(&pair[1])?))
        }
        Value::Object(map) => {
            Some(Point::new(f64::from_param(map.get("x")?)?, f64::from_param(map.get("y")?)?))
        }
        _ => None,
    }
}

impl FromParam for Color {
    const EXPECTED: &'static str = "a color as #RRGGBB, r,g,b or a color name";

    fn from_param(value: &Value) -> Option<Self> {
        match value {
            Value::String(raw) => {
                let raw = raw.trim();
                if raw.contains(',') {
                    let channels = raw
                        .split(',')
                        .map(|part| part.trim().parse::<u8>().ok())
                        .collect::<Option<Vec<_>>>()?;
                    return rgb_from_channels(&channels);
                }
                Color::from_hex(raw).or_else(|| Color::named(raw))
            }
            Value::Array(items) => {
                let channels = items.iter().map(u8::from_param).collect::<Option<Vec<_>>>()?;
                rgb_from_channels(&channels)
            }
            Value::Object(map) => Some(Color::rgb(
                u8::from_param(map.get("r")?)?,
                u8::from_param(map.get("g")?)?,
                u8::from_param(map.get("b")?)?,
            )),
            _ => None,
        }
    }
}

fn rgb_from_channels(channels: &[u8]) -> Option<Color> {
    match channels {
        [r, g, b] => Some(Color::rgb(*r, *g, *b)),
        _ => None,
    }
}

/// Named colors given as `"header=#ff0000;body=255,255,255"` or a JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMap(pub BTreeMap<String, Color>);

impl FromParam for ColorMap {
    const EXPECTED: &'static str = "a color map like header=#ff0000;body=#ffffff";

    fn from_param(value: &Value) -> Option<Self> {
        let mut colors = BTreeMap::new();
        match value {
            Value::String(raw) => {
                for entry in raw.split(';').map(str::trim).filter(|entry| !entry.is_empty()) {
                    let (name, color) = entry.split_once('=')?;
                    let name = name.trim();
                    if name.is_empty() {
                        return None;
                    }
                    let color = Color::from_param(&Value::String(color.trim().to_owned()))?;
                    colors.insert(name.to_owned(), color);
                }
            }
            Value::Object(map) => {
                for (name, color) in map {
                    colors.insert(name.clone(), Color::from_param(color)?);
                }
            }
            _ => return None,
        }
        (!colors.is_empty()).then_some(Self(colors))
    }
}

const A1_RANGE_PATTERN: &str = concat!(
    r"^\s*([A-Za-z]{1,3})([1-9][0-9]{0,6})\s*",
    r"(?::\s*([A-Za-z]{1,3})([1-9][0-9]{0,6})\s*)?$"
);

fn a1_range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(A1_RANGE_PATTERN).expect("A1 range pattern compiles"))
}

impl FromParam for CellRange {
    const EXPECTED: &'static str = "a cell range like A1:C3";

    fn from_param(value: &Value) -> Option<Self> {
        match value {
            Value::String(raw) => {
                let caps = a1_range_regex().captures(raw)?;
                let start = (caps[2].parse::<usize>().ok()? - 1, column_index(&caps[1])?);
                let end = match (caps.get(3), caps.get(4)) {
                    (Some(col), Some(row)) => {
                        (row.as_str().parse::<usize>().ok()? - 1, column_index(col.as_str())?)
                    }
                    _ => start,
                };
                Some(CellRange::spanning(start, end))
            }
            Value::Object(map) => {
                let field = |camel: &str, snake: &str| {
                    map.get(camel).or_else(|| map.get(snake)).and_then(usize::from_param)
                };
                Some(CellRange::spanning(
                    (field("startRow", "start_row")?, field("startCol", "start_col")?),
                    (field("endRow", "end_row")?, field("endCol", "end_col")?),
                ))
            }
            _ => None,
        }
    }
}

/// Tab stops given as `"72:left;144:decimal:."` or an array of such strings or of
/// `{"position": .., "alignment": .., "leader": ..}` objects.
#[derive(Debug, Clone, PartialEq)]
pub struct TabStops(pub Vec<TabStop>);

impl FromParam for TabStops {
    const EXPECTED: &'static str = "tab stops like 72:left;144:decimal:.";

    fn from_param(value: &Value) -> Option<Self> {
        let stops = match value {
            Value::String(raw) => raw
                .split(';')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(tab_stop_from_str)
                .collect::<Option<Vec<_>>>()?,
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(raw) => tab_stop_from_str(raw),
                    Value::Object(map) => {
                        let position = f64::from_param(map.get("position")?)?;
                        let alignment = match map.get("alignment") {
                            Some(Value::String(raw)) => TabAlignment::parse(raw)?,
                            None => TabAlignment::Left,
                            Some(_) => return None,
                        };
                        let leader = match map.get("leader") {
                            Some(Value::String(raw)) => Some(single_char(raw)?),
                            None | Some(Value::Null) => None,
                            Some(_) => return None,
                        };
                        checked_tab_stop(position, alignment, leader)
                    }
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()?,
            _ => return None,
        };
        (!stops.is_empty()).then_some(Self(stops))
    }
}

fn tab_stop_from_str(raw: &str) -> Option<TabStop> {
    let mut parts = raw.splitn(3, ':');
    let position = parts.next()?.trim().parse::<f64>().ok()?;
    let alignment = match parts.next() {
        Some(raw) => TabAlignment::parse(raw)?,
        None => TabAlignment::Left,
    };
    let leader = match parts.next() {
        Some(raw) => Some(single_char(raw)?),
        None => None,
    };
    checked_tab_stop(position, alignment, leader)
}

fn single_char(raw: &str) -> Option<char> {
    let mut chars = raw.chars();
    let ch = chars.next()?;
    chars.next().is_none().then_some(ch)
}

fn checked_tab_stop(
    position: f64,
    alignment: TabAlignment,
    leader: Option<char>,
) -> Option<TabStop> {
    (position.is_finite() && position >= 0.0).then_some(TabStop { position, alignment, leader })
}
