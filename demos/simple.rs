use grid_bestfirst::{SearchSession, SearchState};
use grid_util::point::Point;

// In this demo a run is stepped to completion on a 3x3 grid with shape
//  ___
// |S  |
// | # |
// |  G|
//  ___
// where
// - # marks an obstacle
// - S marks the start
// - G marks the goal

fn main() {
    let mut session = SearchSession::new(3, 3);
    session.designate_endpoint(Point::new(0, 2)).unwrap();
    session.designate_endpoint(Point::new(2, 0)).unwrap();
    session.toggle_obstacle(Point::new(1, 1), true).unwrap();
    session.start_run().unwrap();
    let mut ticks = 0;
    while session.advance() == SearchState::Running {
        ticks += 1;
    }
    println!("{}", session.grid());
    println!("Finished after {} ticks", ticks);
    if let Some(path) = session.path() {
        println!("Path:");
        for p in path {
            println!("{:?}", p);
        }
    }
}
