/// Calculate a racer's score for a race.
///
/// Finishers earn one point per racer they beat plus one, and the winner gets
/// `first_place_bonus` on top. Racers who did not finish lose `crash_penalty`
/// per crash.
pub fn calculate_score(
    place: Option<u32>,
    racer_count: usize,
    crashes: u32,
    first_place_bonus: i32,
    crash_penalty: i32,
) -> i32 {
    match place {
        Some(place) => {
            let beaten = racer_count as i32 - place as i32;
            let bonus = if place == 1 { first_place_bonus } else { 0 };
            beaten + 1 + bonus
        },
        None => -(crashes as i32) * crash_penalty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winner_gets_bonus() {
        assert_eq!(calculate_score(Some(1), 4, 0, 2, 1), 4 + 2);
    }

    #[test]
    fn last_finisher_gets_one_point() {
        assert_eq!(calculate_score(Some(4), 4, 3, 2, 1), 1);
    }

    #[test]
    fn non_finisher_pays_for_crashes() {
        assert_eq!(calculate_score(None, 4, 3, 2, 1), -3);
        assert_eq!(calculate_score(None, 4, 0, 2, 1), 0);
    }
}
