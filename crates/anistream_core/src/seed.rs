//! Sample catalog used to bootstrap an empty store.

use crate::domain::{Episode, Title, TitleDraft, TitleStatus};

const BUNNY: &str = "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4";
const DREAM: &str = "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ElephantsDream.mp4";
const BLAZES: &str = "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerBlazes.mp4";

struct Sample {
    name: &'static str,
    native: &'static str,
    synopsis: &'static str,
    cover: &'static str,
    banner: &'static str,
    genres: &'static [&'static str],
    status: TitleStatus,
    rating: f64,
    year: i32,
    total_episodes: i32,
    featured: bool,
    episodes: &'static [(i32, &'static str, &'static str, &'static str)],
}

pub fn sample_titles() -> Vec<Title> {
    samples().into_iter().map(Sample::into_title).collect()
}

impl Sample {
    fn into_title(self) -> Title {
        let mut title = Title::from_draft(TitleDraft {
            name: self.name.to_string(),
            name_native: Some(self.native.to_string()),
            synopsis: Some(self.synopsis.to_string()),
            cover_image: Some(self.cover.to_string()),
            banner_image: Some(self.banner.to_string()),
            genres: self.genres.iter().map(|g| g.to_string()).collect(),
            status: self.status,
            rating: Some(self.rating),
            release_year: Some(self.year),
            total_episode_count: Some(self.total_episodes),
            is_featured: self.featured,
        });
        title.episodes = self
            .episodes
            .iter()
            .map(|(number, name, url, duration)| Episode {
                number: *number,
                title: name.to_string(),
                video_url: url.to_string(),
                thumbnail: None,
                duration: Some(duration.to_string()),
            })
            .collect();
        title
    }
}

fn samples() -> Vec<Sample> {
    vec![
        Sample {
            name: "Attack on Titan",
            native: "進撃の巨人",
            synopsis: "Humanity lives inside cities surrounded by enormous walls due to the Titans, gigantic humanoid creatures who devour humans seemingly without reason.",
            cover: "https://cdn.myanimelist.net/images/anime/10/47347l.jpg",
            banner: "https://images.unsplash.com/photo-1613487971624-24f87ffdbfc5?q=80&w=1920&auto=format&fit=crop",
            genres: &["Action", "Drama", "Fantasy", "Mystery"],
            status: TitleStatus::Completed,
            rating: 9.0,
            year: 2013,
            total_episodes: 87,
            featured: true,
            episodes: &[
                (1, "To You, 2,000 Years in the Future", BUNNY, "24:00"),
                (2, "That Day", DREAM, "24:00"),
                (3, "A Dim Light in the Darkness of Despair", BLAZES, "24:00"),
            ],
        },
        Sample {
            name: "Demon Slayer",
            native: "鬼滅の刃",
            synopsis: "A family is attacked by demons and only two members survive - Tanjiro and his sister Nezuko, who is turning into a demon slowly.",
            cover: "https://cdn.myanimelist.net/images/anime/1286/99889l.jpg",
            banner: "https://images.unsplash.com/photo-1572291244855-44aa55da2137?q=80&w=1920&auto=format&fit=crop",
            genres: &["Action", "Fantasy", "Supernatural"],
            status: TitleStatus::Ongoing,
            rating: 8.9,
            year: 2019,
            total_episodes: 44,
            featured: true,
            episodes: &[
                (1, "Cruelty", BUNNY, "24:00"),
                (2, "Trainer Sakonji Urokodaki", DREAM, "24:00"),
            ],
        },
        Sample {
            name: "Jujutsu Kaisen",
            native: "呪術廻戦",
            synopsis: "A boy swallows a cursed talisman - the finger of a demon - and becomes cursed himself. He enters a shaman school to be able to locate the demon's other body parts and thus exorcise himself.",
            cover: "https://cdn.myanimelist.net/images/anime/1171/109222l.jpg",
            banner: "https://images.unsplash.com/photo-1656857221015-ddc2163a08da?q=80&w=1920&auto=format&fit=crop",
            genres: &["Action", "Fantasy", "School", "Supernatural"],
            status: TitleStatus::Ongoing,
            rating: 8.7,
            year: 2020,
            total_episodes: 47,
            featured: true,
            episodes: &[(1, "Ryomen Sukuna", BUNNY, "24:00")],
        },
        Sample {
            name: "My Hero Academia",
            native: "僕のヒーローアカデミア",
            synopsis: "In a world where most of the population has superpowers, a powerless boy dreams of becoming a hero.",
            cover: "https://cdn.myanimelist.net/images/anime/10/78745l.jpg",
            banner: "https://images.unsplash.com/photo-1610114586897-20495783e96c?q=80&w=1920&auto=format&fit=crop",
            genres: &["Action", "Comedy", "School", "Superhero"],
            status: TitleStatus::Ongoing,
            rating: 8.4,
            year: 2016,
            total_episodes: 138,
            featured: false,
            episodes: &[(1, "Izuku Midoriya: Origin", BUNNY, "24:00")],
        },
        Sample {
            name: "One Punch Man",
            native: "ワンパンマン",
            synopsis: "The story of Saitama, a hero who can defeat any opponent with a single punch but seeks to find a worthy opponent.",
            cover: "https://cdn.myanimelist.net/images/anime/12/76049l.jpg",
            banner: "https://images.unsplash.com/photo-1703305776558-e5568941ae7a?q=80&w=1920&auto=format&fit=crop",
            genres: &["Action", "Comedy", "Parody", "Superhero"],
            status: TitleStatus::Ongoing,
            rating: 8.5,
            year: 2015,
            total_episodes: 24,
            featured: false,
            episodes: &[(1, "The Strongest Man", BUNNY, "24:00")],
        },
        Sample {
            name: "Death Note",
            native: "デスノート",
            synopsis: "A high school student discovers a supernatural notebook that allows him to kill anyone by writing the victim's name while picturing their face.",
            cover: "https://cdn.myanimelist.net/images/anime/9/9453l.jpg",
            banner: "https://images.unsplash.com/photo-1613487971624-24f87ffdbfc5?q=80&w=1920&auto=format&fit=crop",
            genres: &["Mystery", "Psychological", "Supernatural", "Thriller"],
            status: TitleStatus::Completed,
            rating: 9.0,
            year: 2006,
            total_episodes: 37,
            featured: false,
            episodes: &[(1, "Rebirth", BUNNY, "23:00")],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_are_distinct_manual_titles() {
        let titles = sample_titles();
        assert_eq!(titles.len(), 6);
        assert_eq!(titles.iter().filter(|t| t.is_featured).count(), 3);
        let mut ids: Vec<_> = titles.iter().map(|t| t.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 6);
        assert!(titles.iter().all(|t| t.external_id.is_none() && !t.episodes.is_empty()));
    }
}
