//! Catalogs with round numbers so expected times are easy to check by hand.

#![allow(dead_code)]

use trip_planner::catalog::{Catalog, Location, TravelEdge, WeeklyHours};
use trip_planner::plan::Plan;

/// Two sights open 08:00-20:00 every day, 120 min dwell, 60 min apart.
pub fn twin_sights() -> Catalog {
    let hours = WeeklyHours::every_day(&[(8, 20)]).expect("valid hours");
    Catalog::new(
        vec![
            Location::new("museum", 120, hours.clone()),
            Location::new("garden", 120, hours),
        ],
        vec![
            TravelEdge::new("museum", "garden", 60),
            TravelEdge::new("garden", "museum", 60),
        ],
    )
    .expect("valid catalog")
}

/// Three sights with asymmetric travel times.
pub fn one_way_streets() -> Catalog {
    let hours = WeeklyHours::every_day(&[(9, 17)]).expect("valid hours");
    Catalog::new(
        vec![
            Location::new("castle", 90, hours.clone()),
            Location::new("harbor", 45, hours.clone()),
            Location::new("market", 30, hours),
        ],
        vec![
            TravelEdge::new("castle", "harbor", 20),
            TravelEdge::new("harbor", "castle", 35),
            TravelEdge::new("castle", "market", 10),
            TravelEdge::new("market", "castle", 15),
            TravelEdge::new("harbor", "market", 25),
            TravelEdge::new("market", "harbor", 5),
        ],
    )
    .expect("valid catalog")
}

pub fn plan(lines: &[&str]) -> Plan {
    Plan::parse(&lines.join("\n"))
}
