//! Example that displays the machine's affinity domains and resolves a
//! couple of selector expressions against them.

fn main() {
    env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Info)
        .init();

    let topology = match cpu_domains::topology() {
        Ok(topology) => topology,
        Err(e) => {
            eprintln!("Error discovering CPU topology: {}", e);
            return;
        }
    };

    println!("CPU Topology:");
    println!("-------------");
    println!("Sockets: {}", topology.num_sockets());
    println!("Cores per socket: {}", topology.num_cores_per_socket());
    println!("Threads per core: {}", topology.num_threads_per_core());
    println!("Active hardware threads: {}", topology.active_hw_threads());

    let numa = match cpu_domains::numa_info() {
        Ok(numa) => numa,
        Err(e) => {
            eprintln!("Error discovering NUMA layout: {}", e);
            return;
        }
    };
    println!("NUMA nodes: {}", numa.num_nodes());

    let domains = match cpu_domains::affinity_domains() {
        Ok(domains) => domains,
        Err(e) => {
            eprintln!("Error building affinity domains: {}", e);
            return;
        }
    };

    println!("\nAffinity Domains:");
    for domain in &domains.domains {
        println!(
            "  {:<4} cores={:<4} processors={:<4} list={:?}",
            domain.tag, domain.num_cores, domain.num_processors, domain.processor_list
        );
    }

    for expr in ["N:0-3", "S0:scatter", "E:N:4:2:4"] {
        match cpu_domains::cpu_list(expr, 8) {
            Ok(list) => println!("\n\"{expr}\" -> {list:?}"),
            Err(e) => eprintln!("\n\"{expr}\" -> error: {e}"),
        }
    }
}
