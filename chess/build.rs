use std::path::Path;
use std::{env, io};

use rand_core::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

pub fn default_gen() -> impl RngCore {
    Xoshiro256PlusPlus::seed_from_u64(0x6b65_7374_7265_6c21_u64)
}

mod zobrist {
    use std::io::{self, BufWriter, Write};
    use std::{fs, path::Path};

    use kestrel_base::types::Cell;
    use rand_core::RngCore;

    struct Zobrist {
        pieces: [[u64; 64]; Cell::COUNT],
        move_side: u64,
        castling: [u64; 16],
        enpassant: [u64; 8],
    }

    impl Zobrist {
        fn generate<R: RngCore>(gen: &mut R) -> Zobrist {
            let pieces = {
                let mut res = [[0_u64; 64]; Cell::COUNT];
                for sub in res.iter_mut().skip(1) {
                    for x in sub {
                        *x = gen.next_u64();
                    }
                }
                res
            };
            let castling = {
                let base = [(); 4].map(|_| gen.next_u64());
                let mut res = [0_u64; 16];
                for (i, val) in res.iter_mut().enumerate() {
                    for (j, base_val) in base.iter().enumerate() {
                        if (i >> j) & 1 != 0 {
                            *val ^= base_val;
                        }
                    }
                }
                res
            };
            Zobrist {
                pieces,
                move_side: gen.next_u64(),
                castling,
                enpassant: [(); 8].map(|_| gen.next_u64()),
            }
        }

        fn output<W: Write>(&self, w: &mut W) -> io::Result<()> {
            writeln!(w, "const PIECES: [[u64; 64]; Cell::COUNT] = [")?;
            for (i, sub) in self.pieces.iter().enumerate() {
                writeln!(w, "    /*{:2}*/ [", i)?;
                for (i, hsh) in sub.iter().enumerate() {
                    writeln!(w, "        /*{:2}*/ {:#x},", i, hsh)?;
                }
                writeln!(w, "    ],")?;
            }
            writeln!(w, "];\n")?;

            writeln!(w, "pub const MOVE_SIDE: u64 = {:#x};\n", self.move_side)?;

            writeln!(w, "const CASTLING: [u64; 16] = [")?;
            for (i, sub) in self.castling.iter().enumerate() {
                writeln!(w, "    /*{:2}*/ {:#x},", i, sub)?;
            }
            writeln!(w, "];\n")?;

            writeln!(w, "const ENPASSANT: [u64; 8] = [")?;
            for (i, sub) in self.enpassant.iter().enumerate() {
                writeln!(w, "    /*{}*/ {:#x},", i, sub)?;
            }
            writeln!(w, "];")?;

            Ok(())
        }
    }

    pub fn gen(out_path: &Path) -> io::Result<()> {
        let zobrist = Zobrist::generate(&mut super::default_gen());
        zobrist.output(&mut BufWriter::new(&fs::File::create(out_path)?))
    }
}

mod near_attacks {
    use std::io::{self, BufWriter, Write};
    use std::{fs, path::Path};

    use kestrel_base::bitboard::Bitboard;
    use kestrel_base::types::Coord;

    fn generate_directed<const N: usize>(d_file: [isize; N], d_rank: [isize; N]) -> [Bitboard; 64] {
        let mut res = [Bitboard::EMPTY; 64];
        for c in Coord::iter() {
            let mut bb = Bitboard::EMPTY;
            for (&delta_file, &delta_rank) in d_file.iter().zip(d_rank.iter()) {
                if let Some(nc) = c.shift(delta_file, delta_rank) {
                    bb.set(nc);
                }
            }
            res[c.index()] = bb;
        }
        res
    }

    pub(crate) fn print_bitboards<W: Write>(
        w: &mut W,
        name: &str,
        bs: &[Bitboard; 64],
    ) -> io::Result<()> {
        writeln!(w, "const {}: [Bitboard; 64] = [", name)?;
        for (i, b) in bs.iter().enumerate() {
            writeln!(w, "    /*{:2}*/ bb(0x{:016x}),", i, b.as_raw())?;
        }
        writeln!(w, "];")?;
        Ok(())
    }

    pub fn gen(out_path: &Path) -> io::Result<()> {
        let f = fs::File::create(out_path)?;
        let mut w = BufWriter::new(&f);

        print_bitboards(
            &mut w,
            "KING_ATTACKS",
            &generate_directed([-1, -1, -1, 0, 0, 1, 1, 1], [-1, 0, 1, -1, 1, -1, 0, 1]),
        )?;
        writeln!(&mut w)?;
        print_bitboards(
            &mut w,
            "KNIGHT_ATTACKS",
            &generate_directed([-2, -2, -1, -1, 2, 2, 1, 1], [-1, 1, -2, 2, -1, 1, -2, 2]),
        )?;
        writeln!(&mut w)?;
        print_bitboards(
            &mut w,
            "WHITE_PAWN_ATTACKS",
            &generate_directed([-1, 1], [1, 1]),
        )?;
        writeln!(&mut w)?;
        print_bitboards(
            &mut w,
            "BLACK_PAWN_ATTACKS",
            &generate_directed([-1, 1], [-1, -1]),
        )?;

        Ok(())
    }
}

mod rays {
    use std::io::{self, BufWriter, Write};
    use std::{fs, path::Path};

    use kestrel_base::bitboard::Bitboard;
    use kestrel_base::rays::{self, Direction};
    use kestrel_base::types::Coord;

    use super::near_attacks::print_bitboards;

    fn per_coord(f: impl Fn(Coord) -> Bitboard) -> [Bitboard; 64] {
        let mut res = [Bitboard::EMPTY; 64];
        for c in Coord::iter() {
            res[c.index()] = f(c);
        }
        res
    }

    pub fn gen(out_path: &Path) -> io::Result<()> {
        let f = fs::File::create(out_path)?;
        let mut w = BufWriter::new(&f);

        writeln!(w, "const RAYS: [[Bitboard; 64]; Direction::COUNT] = [")?;
        for d in Direction::ALL {
            writeln!(w, "    // {:?}", d)?;
            writeln!(w, "    [")?;
            for c in Coord::iter() {
                writeln!(
                    w,
                    "        /*{:2}*/ bb(0x{:016x}),",
                    c.index(),
                    rays::ray(d, c).as_raw()
                )?;
            }
            writeln!(w, "    ],")?;
        }
        writeln!(w, "];\n")?;

        print_bitboards(&mut w, "RANK_FILE", &per_coord(rays::rank_file))?;
        writeln!(w)?;
        print_bitboards(&mut w, "DIAGONALS", &per_coord(rays::diagonals))?;
        writeln!(w)?;

        writeln!(w, "const BETWEEN: [[Bitboard; 64]; 64] = [")?;
        for a in Coord::iter() {
            writeln!(w, "    /*{:2}*/ [", a.index())?;
            for b in Coord::iter() {
                writeln!(w, "        bb(0x{:016x}),", rays::between(a, b).as_raw())?;
            }
            writeln!(w, "    ],")?;
        }
        writeln!(w, "];")?;

        Ok(())
    }
}

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = env::var("OUT_DIR").map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    zobrist::gen(&Path::new(&out_dir).join("zobrist.rs"))?;
    near_attacks::gen(&Path::new(&out_dir).join("near_attacks.rs"))?;
    rays::gen(&Path::new(&out_dir).join("rays.rs"))?;

    Ok(())
}
