//! Pedestrian network tag filter.
//!
//! A way is walkable when it carries a `highway` tag that is not one of
//! the excluded values and nothing marks it as closed to pedestrians.

/// `highway` values that are never part of the walking network.
pub const EXCLUDED_HIGHWAYS: &[&str] = &[
    "abandoned",
    "bus_guideway",
    "construction",
    "cycleway",
    "motor",
    "motorway",
    "motorway_link",
    "no",
    "planned",
    "platform",
    "proposed",
    "raceway",
    "razed",
];

/// Returns `true` if a way with these tags belongs in the walking network.
pub fn is_walkable<'a>(tags: impl IntoIterator<Item = (&'a str, &'a str)>) -> bool {
    let mut has_highway = false;

    for (key, value) in tags {
        match key {
            "highway" => {
                if EXCLUDED_HIGHWAYS.contains(&value) {
                    return false;
                }
                has_highway = true;
            }
            "area" if value == "yes" => return false,
            "foot" if value == "no" => return false,
            "service" | "access" if value == "private" => return false,
            _ => {}
        }
    }

    has_highway
}

/// Overpass QL tag filter equivalent to [`is_walkable`].
#[must_use]
pub fn overpass_filter() -> String {
    format!(
        "[\"highway\"][\"area\"!~\"^yes$\"][\"highway\"!~\"^({})$\"]\
         [\"foot\"!~\"^no$\"][\"service\"!~\"^private$\"][\"access\"!~\"^private$\"]",
        EXCLUDED_HIGHWAYS.join("|")
    )
}
