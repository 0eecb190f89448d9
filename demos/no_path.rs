use grid_bestfirst::{SearchSession, SearchState};
use grid_util::point::Point;

// In this demo the goal is walled off, so the frontier drains without ever
// reaching it:
//  ___
// |S#G|
//  ___

fn main() {
    let mut session = SearchSession::new(3, 1);
    session.designate_endpoint(Point::new(0, 0)).unwrap();
    session.designate_endpoint(Point::new(2, 0)).unwrap();
    session.toggle_obstacle(Point::new(1, 0), true).unwrap();
    session.refresh_components();
    let predicted = session
        .grid()
        .reachable(&Point::new(0, 0), &Point::new(2, 0));
    println!("component prediction says reachable: {}", predicted);

    session.start_run().unwrap();
    while session.advance() == SearchState::Running {}
    println!("{}", session.grid());
    let goal_visited = session
        .grid()
        .cell(&Point::new(2, 0))
        .map(|c| c.visited)
        .unwrap_or(false);
    println!(
        "finished; goal visited: {}, path found: {}",
        goal_visited,
        session.path().is_some()
    );
}
